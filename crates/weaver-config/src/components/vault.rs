//! Vault scanning configuration

use serde::{Deserialize, Serialize};

/// Default maximum note size (10 MB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Which files make up the vault and how they are written back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Glob patterns (relative to the vault root) of notes to load
    pub include: Vec<String>,
    /// Glob patterns excluded even when included
    pub exclude: Vec<String>,
    /// Write `<name>.backup_<timestamp>.bak` before overwriting a note
    pub backup: bool,
    /// Notes larger than this are skipped
    pub max_file_size: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*.md".to_string()],
            exclude: vec![
                "**/.obsidian/**".to_string(),
                "**/node_modules/**".to_string(),
                "**/.git/**".to_string(),
                "**/.weaver/**".to_string(),
            ],
            backup: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}
