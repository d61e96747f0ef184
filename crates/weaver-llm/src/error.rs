//! Embedding client errors

use thiserror::Error;
use weaver_core::SimilarityError;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("{provider} error: {message}")]
    ProviderError { provider: String, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

impl From<EmbeddingError> for SimilarityError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::Timeout { timeout_secs } => SimilarityError::Timeout(timeout_secs * 1000),
            EmbeddingError::InvalidResponse(msg) => SimilarityError::InvalidResponse(msg),
            other => SimilarityError::Unavailable(other.to_string()),
        }
    }
}
