use thiserror::Error;

#[derive(Error, Debug)]
pub enum RadarError {
    #[error("database error: {0}")]
    Database(String),

    /// Transient network failure talking to a fetcher target, the LLM
    /// endpoint, or a delivery sink. Callers retry, then mark the item
    /// ERROR with a short reason tag rather than aborting the batch.
    #[error("network error: {0}")]
    Network(String),

    /// LLM or entity output that failed validation. Always dropped
    /// silently rather than propagated — never blocks a batch.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type RadarResult<T> = Result<T, RadarError>;
