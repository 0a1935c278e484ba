use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,

    pub openrouter_api_key: String,
    pub llm_concurrency: usize,

    pub telegram_bot_token: String,
    pub telegram_chat_id: String,

    pub brave_api_key: String,
    pub serper_api_key: String,

    pub http_rate_limit_per_domain: f64,
    pub max_alerts_per_day: u32,
}

impl Config {
    /// Load configuration from environment variables. Panics with a clear
    /// message if a required var is missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            openrouter_api_key: required_env("OPENROUTER_API_KEY"),
            llm_concurrency: env::var("LLM_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID").unwrap_or_default(),
            brave_api_key: env::var("BRAVE_API_KEY").unwrap_or_default(),
            serper_api_key: env::var("SERPER_API_KEY").unwrap_or_default(),
            http_rate_limit_per_domain: env::var("HTTP_RATE_LIMIT_PER_DOMAIN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1.0),
            max_alerts_per_day: env::var("MAX_ALERTS_PER_DAY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
        }
    }

    /// Load config for the read-only query server: only the database
    /// connection is required, nothing credential-bearing.
    pub fn server_from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            openrouter_api_key: String::new(),
            llm_concurrency: 0,
            telegram_bot_token: String::new(),
            telegram_chat_id: String::new(),
            brave_api_key: String::new(),
            serper_api_key: String::new(),
            http_rate_limit_per_domain: 0.0,
            max_alerts_per_day: 0,
        }
    }

    /// Whether the Telegram delivery sink has credentials configured. When
    /// false, alerts are still recorded in the ledger but delivery is
    /// skipped (spec 7: fatal-config disables the capability, not the
    /// pipeline).
    pub fn telegram_enabled(&self) -> bool {
        !self.telegram_bot_token.is_empty() && !self.telegram_chat_id.is_empty()
    }

    /// Log the length (not value) of each sensitive env var.
    pub fn log_redacted(&self) {
        let vars = [
            ("DATABASE_URL", &self.database_url),
            ("OPENROUTER_API_KEY", &self.openrouter_api_key),
            ("TELEGRAM_BOT_TOKEN", &self.telegram_bot_token),
            ("TELEGRAM_CHAT_ID", &self.telegram_chat_id),
            ("BRAVE_API_KEY", &self.brave_api_key),
            ("SERPER_API_KEY", &self.serper_api_key),
        ];
        for (name, value) in vars {
            if value.is_empty() {
                tracing::info!("{name} = (empty)");
            } else {
                tracing::info!("{name} = ({} chars)", value.len());
            }
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telegram_enabled_requires_both_fields() {
        let mut cfg = Config::server_from_env_for_test();
        assert!(!cfg.telegram_enabled());
        cfg.telegram_bot_token = "token".into();
        assert!(!cfg.telegram_enabled());
        cfg.telegram_chat_id = "123".into();
        assert!(cfg.telegram_enabled());
    }

    impl Config {
        fn server_from_env_for_test() -> Self {
            Self {
                database_url: "postgres://localhost/test".into(),
                openrouter_api_key: String::new(),
                llm_concurrency: 5,
                telegram_bot_token: String::new(),
                telegram_chat_id: String::new(),
                brave_api_key: String::new(),
                serper_api_key: String::new(),
                http_rate_limit_per_domain: 1.0,
                max_alerts_per_day: 20,
            }
        }
    }
}
