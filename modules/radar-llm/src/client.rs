use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::{LlmError, LlmResult};
use crate::types::{ChatRequest, ChatResponse, LlmConfig, Message, ResponseFormat};

/// The single entry point for LLM calls in the pipeline (event
/// extraction, thesis generation). Wraps an OpenRouter-compatible
/// chat-completions endpoint behind a concurrency gate and a
/// retry-with-backoff loop, so callers never need to think about either.
pub struct LlmClient {
    http: reqwest::Client,
    api_key: String,
    config: LlmConfig,
    semaphore: Arc<Semaphore>,
}

/// Per-call overrides. Any field left `None` falls back to the value in
/// [`LlmConfig`].
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub json_mode: bool,
}

impl LlmClient {
    pub fn new(api_key: impl Into<String>, config: LlmConfig, concurrency: usize) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            config,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    fn headers(&self) -> reqwest::Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Runs a single prompt through the configured model, honoring the
    /// process-wide concurrency gate and retrying transport/5xx failures
    /// with exponential backoff. 4xx responses fail immediately — retrying
    /// a malformed request never succeeds.
    pub async fn complete(
        &self,
        system: Option<&str>,
        prompt: &str,
        opts: CallOptions,
    ) -> LlmResult<String> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("semaphore is never closed");

        let mut messages = Vec::new();
        if let Some(system) = system {
            messages.push(Message {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(Message {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature: Some(opts.temperature.unwrap_or(self.config.temperature)),
            max_tokens: Some(opts.max_tokens.unwrap_or(self.config.max_tokens)),
            response_format: opts.json_mode.then(|| ResponseFormat {
                kind: "json_object".to_string(),
            }),
        };

        let mut last_error = String::new();
        for attempt in 1..=self.config.retries.max(1) {
            match self.try_once(&request).await {
                Ok(text) => return Ok(text),
                Err(LlmError::Client { status, body }) => {
                    return Err(LlmError::Client { status, body });
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!(attempt, retries = self.config.retries, error = %last_error, "LLM call failed, retrying");
                    if attempt < self.config.retries {
                        let wait = self.config.retry_backoff_seconds * 2f64.powi((attempt - 1) as i32);
                        tokio::time::sleep(Duration::from_secs_f64(wait)).await;
                    }
                }
            }
        }

        Err(LlmError::Exhausted {
            attempts: self.config.retries,
            last_error,
        })
    }

    async fn try_once(&self, request: &ChatRequest) -> LlmResult<String> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        debug!(model = %request.model, "LLM chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers().map_err(|e| LlmError::Transport(e.to_string()))?)
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Client {
                status: status.as_u16(),
                body,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Transport(format!("status {status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Transport("empty response from LLM".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> LlmConfig {
        LlmConfig {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "test-model".to_string(),
            temperature: 0.2,
            max_tokens: 1024,
            retries: 3,
            retry_backoff_seconds: 1.0,
            timeout_seconds: 30,
        }
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let cfg = test_config();
        let waits: Vec<f64> = (1..cfg.retries)
            .map(|attempt| cfg.retry_backoff_seconds * 2f64.powi((attempt - 1) as i32))
            .collect();
        assert_eq!(waits, vec![1.0, 2.0]);
    }

    #[tokio::test]
    async fn semaphore_defaults_to_at_least_one_permit() {
        let client = LlmClient::new("key", test_config(), 0);
        assert_eq!(client.semaphore.available_permits(), 1);
    }
}
