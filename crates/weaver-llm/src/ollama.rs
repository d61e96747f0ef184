//! Ollama embedding backend
//!
//! Embeds both passages through `POST {url}/api/embeddings` and returns
//! their cosine similarity. Embeddings are cached per text for the life of
//! the backend, so a target body is embedded once per run however many
//! candidates point at it.

use crate::error::{EmbeddingError, EmbeddingResult};
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use weaver_config::SimilarityConfig;
use weaver_core::{SimilarityBackend, SimilarityError};

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

pub struct OllamaSimilarity {
    client: Client,
    endpoint: String,
    model: String,
    timeout_secs: u64,
    cache: DashMap<String, Arc<Vec<f32>>>,
}

impl OllamaSimilarity {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> EmbeddingResult<Self> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(EmbeddingError::ConfigError("empty Ollama URL".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConfigError(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            model: model.into(),
            timeout_secs,
            cache: DashMap::new(),
        })
    }

    pub fn from_config(config: &SimilarityConfig) -> EmbeddingResult<Self> {
        Self::new(config.url.clone(), config.model.clone(), config.timeout_secs)
    }

    /// Number of distinct texts embedded so far
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Embedding for `text`, from cache when possible
    pub async fn embed(&self, text: &str) -> EmbeddingResult<Arc<Vec<f32>>> {
        if let Some(hit) = self.cache.get(text) {
            return Ok(Arc::clone(hit.value()));
        }
        let embedding = Arc::new(self.request(text).await?);
        self.cache.insert(text.to_string(), Arc::clone(&embedding));
        Ok(embedding)
    }

    async fn request(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.endpoint);
        tracing::debug!(url = %url, chars = text.len(), "embedding request");

        let response = self
            .client
            .post(&url)
            .json(&OllamaEmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout {
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    EmbeddingError::HttpError(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(EmbeddingError::ProviderError {
                provider: "Ollama".to_string(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        let parsed: OllamaEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(format!("failed to parse Ollama response: {e}")))?;
        if parsed.embedding.is_empty() {
            return Err(EmbeddingError::InvalidResponse("empty embedding".to_string()));
        }
        Ok(parsed.embedding)
    }
}

#[async_trait]
impl SimilarityBackend for OllamaSimilarity {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn similarity(&self, source: &str, target: &str) -> Result<f64, SimilarityError> {
        if source.trim().is_empty() || target.trim().is_empty() {
            return Ok(0.0);
        }
        let a = self.embed(source).await?;
        let b = self.embed(target).await?;
        if a.len() != b.len() {
            return Err(SimilarityError::InvalidResponse(format!(
                "embedding dimensions differ: {} vs {}",
                a.len(),
                b.len()
            )));
        }
        Ok(cosine_similarity(&a, &b).max(0.0))
    }
}

/// Cosine of the angle between two vectors; 0 when either is all zeros
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}
