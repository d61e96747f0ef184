//! Semantic similarity backend configuration

use serde::{Deserialize, Serialize};

/// Similarity backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityProvider {
    /// Base confidence only
    #[default]
    None,
    /// Local Ollama embedding server
    Ollama,
    /// Deterministic in-process backend for testing
    Mock,
}

impl SimilarityProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Ollama => "ollama",
            Self::Mock => "mock",
        }
    }
}

/// Similarity refinement settings
///
/// When a provider is configured, variant and synonym scores become
/// `(base_weight * base + similarity_weight * sim) / (base_weight + similarity_weight)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    pub provider: SimilarityProvider,
    /// Base URL of the embedding server
    pub url: String,
    /// Embedding model name
    pub model: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    pub base_weight: f64,
    pub similarity_weight: f64,
    /// Characters of the target body compared against the source paragraph
    pub context_chars: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            provider: SimilarityProvider::None,
            url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            timeout_secs: 10,
            base_weight: 0.6,
            similarity_weight: 0.4,
            context_chars: 2000,
        }
    }
}

impl SimilarityConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != SimilarityProvider::None
    }
}
