//! Candidate matching
//!
//! Two Aho-Corasick automata over the frozen registry: one for exact names
//! (case-sensitive) and one for generated variants (ASCII case-insensitive).
//! The body is scanned left to right; at each character the longest match
//! from either automaton is taken. Matches that touch an exclusion zone or
//! split an ASCII word are skipped by advancing a single character, so a
//! shorter name starting at the same position is never tried instead.

use crate::error::{EngineError, EngineResult};
use crate::registry::Registry;
use crate::variants::{variants, MatchKind, RuleTable};
use crate::zones::ZoneSet;
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, Anchored, Input, MatchKind as AcMatchKind, StartKind};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;
use weaver_parser::Span;

/// One possible target of a candidate span
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateTarget {
    pub document_id: String,
    pub confidence: f64,
    pub match_kind: MatchKind,
}

/// A plain-text span that may refer to other documents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkCandidate {
    pub span: Span,
    pub source_text: String,
    /// Never empty
    pub targets: Vec<CandidateTarget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Names shorter than this many characters are not indexed
    pub min_match_length: usize,
    pub require_word_boundary: bool,
    pub variants_enabled: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            min_match_length: 2,
            require_word_boundary: true,
            variants_enabled: true,
        }
    }
}

struct PatternTable {
    automaton: Option<AhoCorasick>,
    targets: Vec<Vec<CandidateTarget>>,
}

impl PatternTable {
    fn build(entries: BTreeMap<String, Vec<CandidateTarget>>, case_insensitive: bool) -> EngineResult<Self> {
        if entries.is_empty() {
            return Ok(Self {
                automaton: None,
                targets: Vec::new(),
            });
        }

        let (patterns, targets): (Vec<String>, Vec<Vec<CandidateTarget>>) = entries.into_iter().unzip();
        let automaton = AhoCorasickBuilder::new()
            .match_kind(AcMatchKind::LeftmostLongest)
            .ascii_case_insensitive(case_insensitive)
            .start_kind(StartKind::Anchored)
            .build(&patterns)
            .map_err(|e| EngineError::Index(e.to_string()))?;

        Ok(Self {
            automaton: Some(automaton),
            targets,
        })
    }

    /// Longest pattern starting exactly at `pos`
    fn longest_at(&self, body: &str, pos: usize) -> Option<(usize, &[CandidateTarget])> {
        let automaton = self.automaton.as_ref()?;
        let input = Input::new(body).span(pos..body.len()).anchored(Anchored::Yes);
        let found = automaton.find(input)?;
        Some((found.end(), &self.targets[found.pattern().as_usize()]))
    }

    fn len(&self) -> usize {
        self.targets.len()
    }
}

/// Searchable index over every registry name and its variants
pub struct MatchIndex {
    exact: PatternTable,
    variant: PatternTable,
    options: MatchOptions,
}

impl std::fmt::Debug for MatchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchIndex")
            .field("exact_patterns", &self.exact.len())
            .field("variant_patterns", &self.variant.len())
            .field("options", &self.options)
            .finish()
    }
}

impl MatchIndex {
    pub fn build(registry: &Registry, rules: &RuleTable, options: MatchOptions) -> EngineResult<Self> {
        let long_enough = |s: &str| s.chars().count() >= options.min_match_length;

        let mut exact: BTreeMap<String, Vec<CandidateTarget>> = BTreeMap::new();
        let mut variant: BTreeMap<String, Vec<CandidateTarget>> = BTreeMap::new();

        for (name, entry) in registry.iter() {
            if !long_enough(name) {
                continue;
            }
            exact.insert(
                name.to_string(),
                vec![CandidateTarget {
                    document_id: entry.document_id.clone(),
                    confidence: 1.0,
                    match_kind: MatchKind::Exact,
                }],
            );

            if !options.variants_enabled {
                continue;
            }
            for v in variants(name, rules).into_iter().skip(1) {
                if !long_enough(&v.text) {
                    continue;
                }
                let slot = variant.entry(v.text.to_ascii_lowercase()).or_default();
                match slot.iter_mut().find(|t| t.document_id == entry.document_id) {
                    Some(existing) => {
                        let better = v.confidence > existing.confidence
                            || (v.confidence == existing.confidence && v.match_kind < existing.match_kind);
                        if better {
                            existing.confidence = v.confidence;
                            existing.match_kind = v.match_kind;
                        }
                    }
                    None => slot.push(CandidateTarget {
                        document_id: entry.document_id.clone(),
                        confidence: v.confidence,
                        match_kind: v.match_kind,
                    }),
                }
            }
        }

        debug!(
            exact = exact.len(),
            variants = variant.len(),
            "match index built"
        );

        Ok(Self {
            exact: PatternTable::build(exact, false)?,
            variant: PatternTable::build(variant, true)?,
            options,
        })
    }

    pub fn options(&self) -> MatchOptions {
        self.options
    }

    /// Find link candidates in `body`.
    ///
    /// Targets equal to `self_id` are dropped; a span whose only target is
    /// the document itself yields no candidate but is still consumed.
    pub fn find_candidates(&self, body: &str, zones: &ZoneSet, self_id: Option<&str>) -> Vec<LinkCandidate> {
        let mut candidates = Vec::new();
        let mut pos = 0;

        while pos < body.len() {
            let exact = self.exact.longest_at(body, pos);
            let variant = self.variant.longest_at(body, pos);

            let end = match (exact, variant) {
                (Some((a, _)), Some((b, _))) => a.max(b),
                (Some((a, _)), None) => a,
                (None, Some((b, _))) => b,
                (None, None) => {
                    pos = next_char(body, pos);
                    continue;
                }
            };

            let span = Span::new(pos, end);
            if zones.intersects(&span) || (self.options.require_word_boundary && !on_word_boundary(body, span)) {
                pos = next_char(body, pos);
                continue;
            }

            let mut targets: Vec<CandidateTarget> = Vec::new();
            for (match_end, found) in exact.into_iter().chain(variant) {
                if match_end != end {
                    continue;
                }
                for target in found {
                    if self_id == Some(target.document_id.as_str()) {
                        continue;
                    }
                    if !targets.iter().any(|t| t.document_id == target.document_id) {
                        targets.push(target.clone());
                    }
                }
            }

            if !targets.is_empty() {
                candidates.push(LinkCandidate {
                    span,
                    source_text: body[pos..end].to_string(),
                    targets,
                });
            }
            pos = end;
        }

        candidates
    }
}

fn next_char(body: &str, pos: usize) -> usize {
    pos + body[pos..].chars().next().map_or(1, char::len_utf8)
}

/// Whether the span's ASCII word characters stop at its edges
fn on_word_boundary(body: &str, span: Span) -> bool {
    let word = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
    let first = body[span.start..].chars().next();
    let last = body[..span.end].chars().next_back();
    let before = body[..span.start].chars().next_back();
    let after = body[span.end..].chars().next();

    !(word(first) && word(before)) && !(word(last) && word(after))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Corpus, Document};
    use crate::zones::{detect, Zone, ZoneKind, ZoneOptions};
    use weaver_config::{RuleKind, VariantRule};

    fn index_for(docs: &[(&str, &str)], rules: &[VariantRule]) -> MatchIndex {
        let corpus = Corpus::new(docs.iter().map(|(p, c)| Document::parse(*p, c)).collect());
        let registry = Registry::build(&corpus);
        MatchIndex::build(&registry, &RuleTable::new(rules, 16), MatchOptions::default()).unwrap()
    }

    fn find(index: &MatchIndex, body: &str) -> Vec<LinkCandidate> {
        let zones = detect(body, ZoneOptions::default()).zones;
        index.find_candidates(body, &zones, None)
    }

    #[test]
    fn test_longest_match_wins() {
        let index = index_for(
            &[("A.md", "---\ntitle: Machine\n---\n"), ("B.md", "---\ntitle: Machine Learning\n---\n")],
            &[],
        );
        let found = find(&index, "Intro to Machine Learning today");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source_text, "Machine Learning");
        assert_eq!(found[0].targets[0].document_id, "B");
    }

    #[test]
    fn test_exact_match_is_case_sensitive() {
        let index = index_for(&[("A.md", "---\ntitle: Rust\n---\n")], &[]);
        assert!(find(&index, "rust is lowercase").is_empty());
        assert_eq!(find(&index, "Rust is here").len(), 1);
    }

    #[test]
    fn test_zone_blocks_match_without_shorter_retry() {
        let index = index_for(
            &[("A.md", "---\ntitle: Machine\n---\n"), ("B.md", "---\ntitle: Machine Learning\n---\n")],
            &[],
        );
        let body = "Machine Learning";
        let zones = ZoneSet::from_zones(vec![Zone {
            span: Span::new(8, 16),
            kind: ZoneKind::Code,
        }]);
        // The longest match touches the zone; "Machine" is not retried
        assert!(index.find_candidates(body, &zones, None).is_empty());
    }

    #[test]
    fn test_word_boundary_rejects_embedded_ascii() {
        let index = index_for(&[("A.md", "---\ntitle: API\n---\n")], &[]);
        assert!(find(&index, "RAPID growth").is_empty());
        assert_eq!(find(&index, "the API, again").len(), 1);
        // Japanese text has no ASCII neighbours to collide with
        assert_eq!(find(&index, "このAPIは").len(), 1);
    }

    #[test]
    fn test_variant_matches_ascii_case_insensitively() {
        let rules = vec![VariantRule::new(RuleKind::Abbreviation, "DB", &["database"])];
        let index = index_for(&[("D.md", "---\ntitle: DB\n---\n")], &rules);
        let found = find(&index, "A Database stores rows");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source_text, "Database");
        assert_eq!(found[0].targets[0].match_kind, MatchKind::Synonym);
        assert_eq!(found[0].targets[0].confidence, 0.75);
    }

    #[test]
    fn test_exact_and_variant_targets_merge_on_same_span() {
        let rules = vec![VariantRule::new(RuleKind::LongVowel, "バー", &["バ"])];
        let index = index_for(
            &[("S.md", "---\ntitle: サーバ\n---\n"), ("T.md", "---\ntitle: サーバー\n---\n")],
            &rules,
        );
        let found = find(&index, "新しいサーバを");
        assert_eq!(found.len(), 1);
        let kinds: Vec<_> = found[0]
            .targets
            .iter()
            .map(|t| (t.document_id.as_str(), t.match_kind))
            .collect();
        assert_eq!(kinds, vec![("S", MatchKind::Exact), ("T", MatchKind::Variant)]);
    }

    #[test]
    fn test_short_names_are_not_indexed() {
        let index = index_for(&[("A.md", "---\ntitle: C\n---\n")], &[]);
        assert!(find(&index, "C is a language").is_empty());
    }

    #[test]
    fn test_self_links_are_dropped() {
        let index = index_for(&[("Rust.md", "Rust")], &[]);
        let zones = ZoneSet::default();
        assert!(index.find_candidates("Rust rocks", &zones, Some("Rust")).is_empty());
    }
}
