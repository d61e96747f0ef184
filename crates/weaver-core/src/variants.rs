//! Variant generation
//!
//! Pure expansion of a name into alternate spellings and synonyms, driven
//! entirely by a [`RuleTable`]. Each generated variant is the result of
//! applying exactly one rule to the name.

use serde::{Deserialize, Serialize};
use weaver_config::{RuleKind, VariantRule};

/// How a candidate target was matched
///
/// Ordered by preference: exact before variant before synonym.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Variant,
    Synonym,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Variant => "variant",
            Self::Synonym => "synonym",
        }
    }
}

/// A compiled substitution rule
#[derive(Debug, Clone, PartialEq)]
pub struct SubstitutionRule {
    pub pattern: String,
    pub replacements: Vec<String>,
    pub kind: RuleKind,
    pub confidence: f64,
    pub match_kind: MatchKind,
}

impl From<&VariantRule> for SubstitutionRule {
    fn from(rule: &VariantRule) -> Self {
        Self {
            pattern: rule.pattern.clone(),
            replacements: rule.replacements.clone(),
            kind: rule.kind,
            confidence: rule.confidence().clamp(0.0, 1.0),
            match_kind: if rule.kind.is_pair() {
                MatchKind::Synonym
            } else {
                MatchKind::Variant
            },
        }
    }
}

/// Immutable rule table, loaded once per run
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable {
    rules: Vec<SubstitutionRule>,
    max_variants: usize,
}

impl RuleTable {
    pub fn new(rules: &[VariantRule], max_variants: usize) -> Self {
        Self {
            rules: rules.iter().map(SubstitutionRule::from).collect(),
            max_variants: max_variants.max(1),
        }
    }

    /// Table that generates nothing but the name itself
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            max_variants: 1,
        }
    }

    pub fn rules(&self) -> &[SubstitutionRule] {
        &self.rules
    }

    pub fn max_variants(&self) -> usize {
        self.max_variants
    }
}

/// One spelling of a name
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub text: String,
    pub confidence: f64,
    pub match_kind: MatchKind,
}

/// Expand `name` into its variants.
///
/// The first entry is always `name` itself as an exact match. The rest
/// follow rule order, deduplicated ignoring ASCII case and capped at the
/// table's `max_variants`.
pub fn variants(name: &str, table: &RuleTable) -> Vec<Variant> {
    let mut out = vec![Variant {
        text: name.to_string(),
        confidence: 1.0,
        match_kind: MatchKind::Exact,
    }];
    let mut seen = vec![name.to_ascii_lowercase()];

    let mut push = |text: String, rule: &SubstitutionRule, out: &mut Vec<Variant>| {
        if text.trim().is_empty() {
            return;
        }
        let key = text.to_ascii_lowercase();
        if seen.contains(&key) {
            return;
        }
        seen.push(key);
        out.push(Variant {
            text,
            confidence: rule.confidence,
            match_kind: rule.match_kind,
        });
    };

    for rule in &table.rules {
        if rule.pattern.is_empty() {
            continue;
        }
        if rule.kind.is_pair() {
            for replacement in &rule.replacements {
                if let Some(text) = replace_tokens(name, &rule.pattern, replacement) {
                    push(text, rule, &mut out);
                }
            }
            for replacement in rule.replacements.iter().filter(|r| !r.is_empty()) {
                if let Some(text) = replace_tokens(name, replacement, &rule.pattern) {
                    push(text, rule, &mut out);
                }
            }
        } else if name.contains(rule.pattern.as_str()) {
            for replacement in &rule.replacements {
                push(name.replace(rule.pattern.as_str(), replacement), rule, &mut out);
            }
        }
    }

    out.truncate(table.max_variants);
    out
}

/// Replace whole-token occurrences of `from` with `to`.
///
/// ASCII `from` matches ignoring case and only where it is not glued to
/// other ASCII letters or digits. Returns `None` when nothing was replaced.
fn replace_tokens(name: &str, from: &str, to: &str) -> Option<String> {
    if from.is_empty() {
        return None;
    }
    let ascii = from.is_ascii();
    let haystack = if ascii { name.to_ascii_lowercase() } else { name.to_string() };
    let needle = if ascii { from.to_ascii_lowercase() } else { from.to_string() };

    let mut out = String::with_capacity(name.len());
    let mut cursor = 0;
    let mut replaced = false;
    let mut search = 0;

    while let Some(rel) = haystack[search..].find(&needle) {
        let start = search + rel;
        let end = start + needle.len();
        if !ascii || is_token(name, start, end) {
            out.push_str(&name[cursor..start]);
            out.push_str(to);
            cursor = end;
            replaced = true;
            search = end;
        } else {
            search = start + name[start..].chars().next().map_or(1, char::len_utf8);
        }
        if search >= haystack.len() {
            break;
        }
    }

    if !replaced {
        return None;
    }
    out.push_str(&name[cursor..]);
    Some(out)
}

fn is_token(text: &str, start: usize, end: usize) -> bool {
    let word = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    !word(text[..start].chars().next_back()) && !word(text[end..].chars().next())
}
