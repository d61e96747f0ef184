//! # Weaver Configuration
//!
//! Type-safe configuration for the Weaver auto-linker.
//!
//! Configuration lives in a single TOML file with one table per concern:
//!
//! ```toml
//! [vault]
//! include = ["**/*.md"]
//! backup = true
//!
//! [linking]
//! confidence_threshold = 0.7
//! max_links_per_document = 50
//!
//! [variants]
//! rules_file = "rules.yaml"
//!
//! [similarity]
//! provider = "ollama"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every field has a default, so any subset of the file is valid.

pub mod components;
mod error;
mod loader;

pub use components::*;
pub use error::{ConfigError, ConfigResult};
pub use loader::{read_rule_set, ConfigSource, LoadedConfig, CONFIG_FILE_NAME, VAULT_CONFIG_PATH};

use globset::Glob;
use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vault: VaultConfig,
    pub linking: LinkingConfig,
    pub variants: VariantsConfig,
    pub similarity: SimilarityConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges and glob syntax
    pub fn validate(&self) -> ConfigResult<()> {
        let linking = &self.linking;
        if !(0.0..=1.0).contains(&linking.confidence_threshold) {
            return Err(ConfigError::invalid(
                "linking.confidence_threshold",
                format!("{} is outside 0.0..=1.0", linking.confidence_threshold),
            ));
        }
        if !(0.0..=1.0).contains(&linking.ambiguity_margin) {
            return Err(ConfigError::invalid(
                "linking.ambiguity_margin",
                format!("{} is outside 0.0..=1.0", linking.ambiguity_margin),
            ));
        }
        if linking.min_match_length == 0 {
            return Err(ConfigError::invalid("linking.min_match_length", "must be at least 1"));
        }
        if linking.scoring_concurrency == 0 {
            return Err(ConfigError::invalid("linking.scoring_concurrency", "must be at least 1"));
        }
        if self.variants.max_variants == 0 {
            return Err(ConfigError::invalid("variants.max_variants", "must be at least 1"));
        }
        for rule in &self.variants.rules {
            if rule.pattern.is_empty() {
                return Err(ConfigError::invalid("variants.rules", "rule pattern is empty"));
            }
        }

        let sim = &self.similarity;
        if sim.base_weight < 0.0 || sim.similarity_weight < 0.0 {
            return Err(ConfigError::invalid("similarity", "weights must not be negative"));
        }
        if sim.is_enabled() && sim.base_weight + sim.similarity_weight <= 0.0 {
            return Err(ConfigError::invalid("similarity", "weights must not both be zero"));
        }

        for pattern in self.vault.include.iter().chain(&self.vault.exclude) {
            Glob::new(pattern)
                .map_err(|e| ConfigError::invalid("vault", format!("bad glob {pattern:?}: {e}")))?;
        }

        Ok(())
    }
}
