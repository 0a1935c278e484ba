use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    /// Transport failure or 5xx — retried up to `retries` times before
    /// being surfaced.
    #[error("transport error: {0}")]
    Transport(String),

    /// 4xx response — never retried, fails the call immediately.
    #[error("client error ({status}): {body}")]
    Client { status: u16, body: String },

    /// Retries were exhausted without a successful response.
    #[error("exhausted {attempts} attempts calling the LLM: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

pub type LlmResult<T> = Result<T, LlmError>;
