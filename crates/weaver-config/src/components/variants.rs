//! Variant rule configuration
//!
//! Rules are declarative `pattern -> replacements` substitutions. Orthographic
//! rules (long vowel, consonant) describe spelling variants of the same word;
//! pair rules (script pair, abbreviation) describe synonyms and are applied in
//! both directions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Category of a substitution rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// `ー` dropped or written as `ウ`
    LongVowel,
    /// `ヴ` / `ブ`, `ティ` / `テ`
    Consonant,
    /// Latin and katakana spellings of one term
    ScriptPair,
    /// Short form and expansion
    Abbreviation,
}

impl RuleKind {
    /// Pair rules match whole names or tokens and apply both ways
    pub fn is_pair(&self) -> bool {
        matches!(self, Self::ScriptPair | Self::Abbreviation)
    }

    /// Confidence used when a rule omits one
    pub fn default_confidence(&self) -> f64 {
        match self {
            Self::LongVowel => 0.9,
            Self::Consonant => 0.85,
            Self::ScriptPair => 0.8,
            Self::Abbreviation => 0.75,
        }
    }
}

/// One substitution rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRule {
    pub kind: RuleKind,
    pub pattern: String,
    pub replacements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl VariantRule {
    pub fn new(kind: RuleKind, pattern: &str, replacements: &[&str]) -> Self {
        Self {
            kind,
            pattern: pattern.to_string(),
            replacements: replacements.iter().map(|r| r.to_string()).collect(),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn confidence(&self) -> f64 {
        self.confidence.unwrap_or_else(|| self.kind.default_confidence())
    }
}

/// Contents of a rules file.
///
/// Besides the explicit `rules` list, the grouped map form
/// (`long_vowel_patterns`, `consonant_patterns`, `english_japanese_pairs`,
/// `abbreviations`) is accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub rules: Vec<VariantRule>,
    pub long_vowel_patterns: BTreeMap<String, Vec<String>>,
    pub consonant_patterns: BTreeMap<String, Vec<String>>,
    pub english_japanese_pairs: BTreeMap<String, Vec<String>>,
    pub abbreviations: BTreeMap<String, Vec<String>>,
}

impl RuleSet {
    /// Flatten into an ordered rule list: explicit rules first, then grouped maps
    pub fn into_rules(self) -> Vec<VariantRule> {
        let mut rules = self.rules;
        let groups = [
            (RuleKind::LongVowel, self.long_vowel_patterns),
            (RuleKind::Consonant, self.consonant_patterns),
            (RuleKind::ScriptPair, self.english_japanese_pairs),
            (RuleKind::Abbreviation, self.abbreviations),
        ];
        for (kind, map) in groups {
            for (pattern, replacements) in map {
                rules.push(VariantRule {
                    kind,
                    pattern,
                    replacements,
                    confidence: None,
                });
            }
        }
        rules
    }
}

/// Variant generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantsConfig {
    /// Match variants and synonyms at all
    pub enabled: bool,
    /// Cap on variants per name, the name itself included
    pub max_variants: usize,
    /// Start from the built-in rule table
    pub use_builtin: bool,
    /// Extra YAML or TOML rules file, relative to the vault root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_file: Option<PathBuf>,
    /// Extra rules appended after the file's rules
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<VariantRule>,
}

impl Default for VariantsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_variants: 16,
            use_builtin: true,
            rules_file: None,
            rules: Vec::new(),
        }
    }
}

/// Built-in rule table
pub fn builtin_rules() -> Vec<VariantRule> {
    vec![
        VariantRule::new(RuleKind::LongVowel, "ー", &["", "ウ"]),
        VariantRule::new(RuleKind::LongVowel, "ウ", &["ー"]),
        VariantRule::new(RuleKind::Consonant, "ヴ", &["ブ", "バ"]),
        VariantRule::new(RuleKind::Consonant, "ティ", &["テ"]),
        VariantRule::new(RuleKind::Consonant, "ディ", &["デ"]),
        VariantRule::new(RuleKind::ScriptPair, "API", &["エーピーアイ"]),
        VariantRule::new(RuleKind::ScriptPair, "UI", &["ユーアイ"]),
        VariantRule::new(RuleKind::Abbreviation, "DB", &["database", "データベース"]),
        VariantRule::new(RuleKind::Abbreviation, "SSO", &["Single Sign-On"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_maps_flatten_in_kind_order() {
        let yaml = r#"
long_vowel_patterns:
  "ー": ["", "ウ"]
english_japanese_pairs:
  API: ["エーピーアイ"]
rules:
  - kind: consonant
    pattern: "ヴ"
    replacements: ["ブ"]
    confidence: 0.6
"#;
        let set: RuleSet = serde_yaml::from_str(yaml).unwrap();
        let rules = set.into_rules();
        let kinds: Vec<_> = rules.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![RuleKind::Consonant, RuleKind::LongVowel, RuleKind::ScriptPair]
        );
        assert_eq!(rules[0].confidence(), 0.6);
        assert_eq!(rules[1].confidence(), RuleKind::LongVowel.default_confidence());
    }

    #[test]
    fn test_builtin_rules_have_valid_confidences() {
        for rule in builtin_rules() {
            let c = rule.confidence();
            assert!(c > 0.0 && c <= 1.0, "{rule:?}");
            assert!(!rule.pattern.is_empty());
        }
    }
}
