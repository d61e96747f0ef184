//! Auto-linking thresholds and policies

use serde::{Deserialize, Serialize};

/// How new aliases are compared against existing ones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasCompare {
    /// `SSO` and `sso` are the same alias
    #[default]
    CaseInsensitive,
    /// Byte-exact comparison
    Exact,
}

impl AliasCompare {
    /// Whether two alias strings count as the same alias
    pub fn same(&self, a: &str, b: &str) -> bool {
        match self {
            Self::CaseInsensitive => a.to_lowercase() == b.to_lowercase(),
            Self::Exact => a == b,
        }
    }
}

/// Display text used inside generated `[[id|display]]` links
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayPolicy {
    /// Matching alias, else title, else canonical title
    #[default]
    Canonical,
    /// Always the text as written in the source
    Source,
}

/// Auto-linking configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkingConfig {
    /// Minimum confidence for a target to be linked
    pub confidence_threshold: f64,
    /// Two targets closer than this are ambiguous
    pub ambiguity_margin: f64,
    /// Cap on a document's alias list after alias additions
    pub max_aliases_per_document: usize,
    /// Cap on new links per document per run
    pub max_links_per_document: usize,
    /// Treat markdown table rows as exclusion zones
    pub exclude_tables: bool,
    /// Names shorter than this many characters are never matched
    pub min_match_length: usize,
    /// Reject ASCII matches that are part of a longer word
    pub require_word_boundary: bool,
    pub alias_compare: AliasCompare,
    pub display: DisplayPolicy,
    /// Documents scored concurrently when a similarity backend is active
    pub scoring_concurrency: usize,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            ambiguity_margin: 0.05,
            max_aliases_per_document: 10,
            max_links_per_document: 50,
            exclude_tables: false,
            min_match_length: 2,
            require_word_boundary: true,
            alias_compare: AliasCompare::default(),
            display: DisplayPolicy::default(),
            scoring_concurrency: 4,
        }
    }
}
