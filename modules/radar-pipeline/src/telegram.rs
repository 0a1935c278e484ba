use radar_common::Config;

/// Delivery sink for the Telegram bot contract (spec 6: Delivery). When
/// credentials are absent, `send` returns `Ok(None)` rather than an
/// error — alerts are still recorded in the ledger, they simply aren't
/// pushed anywhere, matching how the pipeline runs in environments with
/// no chat configured.
pub struct TelegramSink {
    http: reqwest::Client,
    bot_token: Option<String>,
    chat_id: Option<String>,
}

impl TelegramSink {
    pub fn from_config(config: &Config) -> Self {
        let (bot_token, chat_id) = if config.telegram_enabled() {
            (Some(config.telegram_bot_token.clone()), Some(config.telegram_chat_id.clone()))
        } else {
            (None, None)
        };
        Self {
            http: reqwest::Client::new(),
            bot_token,
            chat_id,
        }
    }

    pub fn enabled(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }

    /// Sends `text` with Markdown parse mode. Returns the delivered
    /// message id on success, `None` when delivery is disabled, and an
    /// error only for an actual transport or API failure — a disabled
    /// sink is not an error condition.
    pub async fn send(&self, text: &str) -> anyhow::Result<Option<String>> {
        let (Some(token), Some(chat_id)) = (&self.bot_token, &self.chat_id) else {
            return Ok(None);
        };

        let url = format!("https://api.telegram.org/bot{token}/sendMessage");
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("telegram sendMessage failed with status {}", response.status());
        }

        let body: serde_json::Value = response.json().await?;
        let message_id = body
            .get("result")
            .and_then(|r| r.get("message_id"))
            .and_then(|v| v.as_i64())
            .map(|id| id.to_string());
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_sink_reports_not_enabled() {
        let sink = TelegramSink {
            http: reqwest::Client::new(),
            bot_token: None,
            chat_id: None,
        };
        assert!(!sink.enabled());
    }
}
