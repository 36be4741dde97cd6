use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    /// The embedding provider could not produce vectors (model load,
    /// provider call, or shape mismatch). Callers degrade, never surface it.
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn embedding<E: std::fmt::Display>(err: E) -> Self {
        Self::EmbeddingUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
