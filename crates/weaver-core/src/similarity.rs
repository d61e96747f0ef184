//! Semantic similarity seam
//!
//! The engine never talks to an embedding service directly. Backends
//! implement [`SimilarityBackend`] and are injected at construction; without
//! one, scoring uses rule confidences only.

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a similarity backend
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimilarityError {
    /// Service unreachable or refused the request
    #[error("similarity backend unavailable: {0}")]
    Unavailable(String),

    /// Service answered with something unusable
    #[error("invalid similarity response: {0}")]
    InvalidResponse(String),

    /// No answer within the configured timeout
    #[error("similarity request timed out after {0} ms")]
    Timeout(u64),
}

/// Scores how related two passages of text are
#[async_trait]
pub trait SimilarityBackend: Send + Sync {
    /// Backend name for logs and reports
    fn name(&self) -> &str;

    /// Similarity in `[0, 1]`, higher meaning more related
    async fn similarity(&self, source: &str, target: &str) -> Result<f64, SimilarityError>;
}
