//! Similarity backends for Weaver
//!
//! Implementations of [`weaver_core::SimilarityBackend`]:
//! - [`OllamaSimilarity`]: cosine similarity of Ollama embeddings
//! - [`MockSimilarity`]: deterministic word overlap for tests and dry runs

pub mod error;
pub mod mock;
pub mod ollama;

pub use error::{EmbeddingError, EmbeddingResult};
pub use mock::MockSimilarity;
pub use ollama::{cosine_similarity, OllamaSimilarity};

use std::sync::Arc;
use std::time::Duration;
use weaver_config::{SimilarityConfig, SimilarityProvider};
use weaver_core::{SimilarityBackend, SimilarityRefiner};

/// Create the configured backend, or `None` when similarity is disabled
pub fn create_backend(config: &SimilarityConfig) -> EmbeddingResult<Option<Arc<dyn SimilarityBackend>>> {
    let backend: Arc<dyn SimilarityBackend> = match config.provider {
        SimilarityProvider::None => return Ok(None),
        SimilarityProvider::Ollama => Arc::new(OllamaSimilarity::from_config(config)?),
        SimilarityProvider::Mock => Arc::new(MockSimilarity::new()),
    };
    tracing::info!(provider = config.provider.as_str(), "similarity backend enabled");
    Ok(Some(backend))
}

/// Wrap a backend with the configured weights and timeout
pub fn create_refiner(config: &SimilarityConfig) -> EmbeddingResult<Option<SimilarityRefiner>> {
    Ok(create_backend(config)?.map(|backend| {
        SimilarityRefiner::new(
            backend,
            config.base_weight,
            config.similarity_weight,
            Duration::from_secs(config.timeout_secs),
            config.context_chars,
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_provider_has_no_backend() {
        let config = SimilarityConfig::default();
        assert!(create_backend(&config).unwrap().is_none());
    }

    #[test]
    fn test_mock_provider() {
        let config = SimilarityConfig {
            provider: SimilarityProvider::Mock,
            ..SimilarityConfig::default()
        };
        let backend = create_backend(&config).unwrap().unwrap();
        assert_eq!(backend.name(), "mock");
    }
}
