//! Configuration file discovery and loading

use crate::components::{builtin_rules, RuleSet, VariantRule};
use crate::error::{ConfigError, ConfigResult};
use crate::Config;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file name at the vault root
pub const CONFIG_FILE_NAME: &str = "weaver.toml";

/// Config file inside the vault's hidden directory
pub const VAULT_CONFIG_PATH: &str = ".weaver/config.toml";

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Passed on the command line
    Explicit(PathBuf),
    /// Found in the vault
    Vault(PathBuf),
    /// No file; built-in defaults
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(path) | Self::Vault(path) => write!(f, "{}", path.display()),
            Self::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Validated configuration together with its origin
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,
}

impl Config {
    /// Load configuration for a vault.
    ///
    /// Lookup order: `explicit`, `<vault>/.weaver/config.toml`,
    /// `<vault>/weaver.toml`, then defaults.
    pub fn load(explicit: Option<&Path>, vault_root: &Path) -> ConfigResult<LoadedConfig> {
        let (config, source) = match explicit {
            Some(path) => (
                Self::load_from_file(path)?,
                ConfigSource::Explicit(path.to_path_buf()),
            ),
            None => {
                let candidates = [vault_root.join(VAULT_CONFIG_PATH), vault_root.join(CONFIG_FILE_NAME)];
                match candidates.into_iter().find(|p| p.is_file()) {
                    Some(path) => (Self::load_from_file(&path)?, ConfigSource::Vault(path)),
                    None => (Self::default(), ConfigSource::Defaults),
                }
            }
        };

        config.validate()?;
        debug!(source = %source, "configuration loaded");
        Ok(LoadedConfig { config, source })
    }

    /// Read and parse a TOML config file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Assemble the variant rule list: built-ins, then the rules file, then inline rules.
    ///
    /// A relative `rules_file` is resolved against `vault_root`.
    pub fn load_rules(&self, vault_root: &Path) -> ConfigResult<Vec<VariantRule>> {
        let variants = &self.variants;
        let mut rules = if variants.use_builtin {
            builtin_rules()
        } else {
            Vec::new()
        };

        if let Some(file) = &variants.rules_file {
            let path = if file.is_absolute() {
                file.clone()
            } else {
                vault_root.join(file)
            };
            let set = read_rule_set(&path)?;
            rules.extend(set.into_rules());
        }

        rules.extend(variants.rules.iter().cloned());

        if let Some(rule) = rules.iter().find(|r| r.pattern.is_empty()) {
            return Err(ConfigError::invalid(
                "variants.rules_file",
                format!("{:?} rule has an empty pattern", rule.kind),
            ));
        }

        debug!(count = rules.len(), "variant rules loaded");
        Ok(rules)
    }
}

/// Parse a YAML or TOML rules file, chosen by extension
pub fn read_rule_set(path: &Path) -> ConfigResult<RuleSet> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match ext.as_deref() {
        Some("yaml") | Some("yml") => {
            if text.trim().is_empty() {
                return Ok(RuleSet::default());
            }
            serde_yaml::from_str(&text).map_err(|source| ConfigError::YamlParse {
                path: path.to_path_buf(),
                source,
            })
        }
        Some("toml") => toml::from_str(&text).map_err(|source| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source,
        }),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}
