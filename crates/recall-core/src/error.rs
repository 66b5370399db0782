use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Provider unreachable, rejected the request, or returned a malformed body.
    #[error("Embedding failed ({provider}): {message}")]
    EmbeddingFailure { provider: String, message: String },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Zero-norm or non-finite vector where a direction is required.
    #[error("Degenerate vector: {0}")]
    DegenerateVector(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    pub fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::EmbeddingFailure { provider: provider.into(), message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
