//! Deterministic similarity backend
//!
//! Scores are the Jaccard overlap of lowercase word sets, unless a fixed
//! score was registered for the target text. Every call is recorded.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use weaver_core::{SimilarityBackend, SimilarityError};

#[derive(Debug, Default)]
pub struct MockSimilarity {
    fixed: HashMap<String, f64>,
    failing: bool,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockSimilarity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `score` when the target text contains `needle`
    pub fn with_score(mut self, needle: impl Into<String>, score: f64) -> Self {
        self.fixed.insert(needle.into(), score);
        self
    }

    /// Backend that fails every request
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl SimilarityBackend for MockSimilarity {
    fn name(&self) -> &str {
        "mock"
    }

    async fn similarity(&self, source: &str, target: &str) -> Result<f64, SimilarityError> {
        self.calls.lock().push((source.to_string(), target.to_string()));
        if self.failing {
            return Err(SimilarityError::Unavailable("mock backend set to fail".to_string()));
        }

        let mut fixed: Vec<_> = self.fixed.iter().filter(|(k, _)| target.contains(k.as_str())).collect();
        fixed.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));
        if let Some((_, score)) = fixed.first() {
            return Ok(**score);
        }

        let (a, b) = (words(source), words(target));
        let union = a.union(&b).count();
        if union == 0 {
            return Ok(0.0);
        }
        Ok(a.intersection(&b).count() as f64 / union as f64)
    }
}
