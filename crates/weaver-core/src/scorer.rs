//! Scoring and disambiguation
//!
//! Every target of a candidate gets a score: 1.0 for exact matches, the rule
//! confidence otherwise, optionally blended with semantic similarity. The
//! targets that clear the threshold are ranked (exact first, then score,
//! then id) and the candidate is accepted, discarded or handed to the user.

use crate::document::Corpus;
use crate::matcher::LinkCandidate;
use crate::similarity::{SimilarityBackend, SimilarityError};
use crate::variants::MatchKind;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use weaver_parser::Span;

/// Tolerance for threshold and margin comparisons
const SCORE_EPSILON: f64 = 1e-9;

/// What to do with ambiguous candidates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMode {
    /// Take the top-ranked target and flag the link as ambiguous
    #[default]
    Automatic,
    /// Leave the choice to the user
    Interactive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTarget {
    pub document_id: String,
    pub match_kind: MatchKind,
    /// Confidence before similarity refinement
    pub base: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    pub score: f64,
}

/// Outcome for one candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Accepted { target: ScoredTarget, ambiguous: bool },
    Discarded,
    AwaitingUser { shortlist: Vec<ScoredTarget> },
}

impl Decision {
    pub fn accepted(&self) -> Option<&ScoredTarget> {
        match self {
            Self::Accepted { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::AwaitingUser { .. })
    }

    /// Settle a pending decision with the user's pick; `None` discards.
    ///
    /// Returns false when the decision is not pending or the pick is not on
    /// the shortlist.
    pub fn choose(&mut self, document_id: Option<&str>) -> bool {
        let Self::AwaitingUser { shortlist } = self else {
            return false;
        };
        match document_id {
            None => {
                *self = Self::Discarded;
                true
            }
            Some(id) => {
                let picked = shortlist.iter().find(|t| t.document_id == id).cloned();
                match picked {
                    Some(target) => {
                        *self = Self::Accepted {
                            target,
                            ambiguous: true,
                        };
                        true
                    }
                    None => false,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    pub threshold: f64,
    pub margin: f64,
    pub mode: ResolveMode,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            margin: 0.05,
            mode: ResolveMode::Automatic,
        }
    }
}

/// Ranking order: exact before inexact, higher score, then lower id
pub fn compare_targets(a: &ScoredTarget, b: &ScoredTarget) -> Ordering {
    let exact = |t: &ScoredTarget| t.match_kind == MatchKind::Exact;
    exact(b)
        .cmp(&exact(a))
        .then_with(|| b.score.total_cmp(&a.score))
        .then_with(|| a.document_id.cmp(&b.document_id))
}

/// Decide a candidate from its scored targets
pub fn decide(targets: Vec<ScoredTarget>, policy: &ScoringPolicy) -> Decision {
    let mut clearing: Vec<ScoredTarget> = targets
        .into_iter()
        .filter(|t| t.score + SCORE_EPSILON >= policy.threshold)
        .collect();
    if clearing.is_empty() {
        return Decision::Discarded;
    }
    clearing.sort_by(compare_targets);

    let top_exact = clearing[0].match_kind == MatchKind::Exact;
    let top_score = clearing[0].score;
    let within: Vec<ScoredTarget> = clearing
        .iter()
        .skip(1)
        .filter(|t| (t.match_kind == MatchKind::Exact) == top_exact)
        .filter(|t| top_score - t.score <= policy.margin + SCORE_EPSILON)
        .cloned()
        .collect();

    let top = clearing.swap_remove(0);
    if within.is_empty() {
        return Decision::Accepted {
            target: top,
            ambiguous: false,
        };
    }

    match policy.mode {
        ResolveMode::Automatic => Decision::Accepted {
            target: top,
            ambiguous: true,
        },
        ResolveMode::Interactive => {
            let mut shortlist = Vec::with_capacity(within.len() + 1);
            shortlist.push(top);
            shortlist.extend(within);
            Decision::AwaitingUser { shortlist }
        }
    }
}

/// Blends rule confidence with semantic similarity from a backend
pub struct SimilarityRefiner {
    backend: Arc<dyn SimilarityBackend>,
    base_weight: f64,
    similarity_weight: f64,
    timeout: Duration,
    context_chars: usize,
    available: AtomicBool,
}

impl SimilarityRefiner {
    pub fn new(
        backend: Arc<dyn SimilarityBackend>,
        base_weight: f64,
        similarity_weight: f64,
        timeout: Duration,
        context_chars: usize,
    ) -> Self {
        Self {
            backend,
            base_weight,
            similarity_weight,
            timeout,
            context_chars,
            available: AtomicBool::new(true),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available.load(AtomicOrdering::Relaxed)
    }

    pub fn blend(&self, base: f64, similarity: f64) -> f64 {
        let total = self.base_weight + self.similarity_weight;
        if total <= 0.0 {
            return base;
        }
        (self.base_weight * base + self.similarity_weight * similarity) / total
    }

    /// Similarity between a source paragraph and the head of a target body
    pub async fn similarity(&self, source: &str, target_body: &str) -> Option<f64> {
        if !self.is_available() {
            return None;
        }
        let target: String = target_body.chars().take(self.context_chars).collect();

        match tokio::time::timeout(self.timeout, self.backend.similarity(source, &target)).await {
            Ok(Ok(sim)) => Some(sim.clamp(0.0, 1.0)),
            Ok(Err(err)) => {
                self.mark_unavailable(&err);
                None
            }
            Err(_) => {
                self.mark_unavailable(&SimilarityError::Timeout(self.timeout.as_millis() as u64));
                None
            }
        }
    }

    fn mark_unavailable(&self, err: &SimilarityError) {
        if self.available.swap(false, AtomicOrdering::SeqCst) {
            warn!(
                backend = self.backend.name(),
                error = %err,
                "similarity backend unavailable, using rule confidences for the rest of the run"
            );
        }
    }
}

/// Scores candidates against a policy, with optional similarity refinement
pub struct Scorer {
    policy: ScoringPolicy,
    refiner: Option<SimilarityRefiner>,
}

impl Scorer {
    pub fn new(policy: ScoringPolicy, refiner: Option<SimilarityRefiner>) -> Self {
        Self { policy, refiner }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// True when a backend was configured but has failed this run
    pub fn backend_lost(&self) -> bool {
        self.refiner.as_ref().is_some_and(|r| !r.is_available())
    }

    /// Whether `resolve` may await a backend
    pub fn refines(&self) -> bool {
        self.refiner.is_some()
    }

    /// Score every target of `candidate` and decide.
    ///
    /// `source_context` is the paragraph around the candidate. Exact targets
    /// are never refined.
    pub async fn resolve(&self, candidate: &LinkCandidate, source_context: &str, corpus: &Corpus) -> Decision {
        let mut scored = Vec::with_capacity(candidate.targets.len());

        for target in &candidate.targets {
            let base = target.confidence;
            let mut similarity = None;

            if target.match_kind != MatchKind::Exact {
                if let (Some(refiner), Some(doc)) = (&self.refiner, corpus.get(&target.document_id)) {
                    similarity = refiner.similarity(source_context, doc.body()).await;
                }
            }

            let score = match (similarity, &self.refiner) {
                (Some(sim), Some(refiner)) => refiner.blend(base, sim),
                _ => base,
            };
            scored.push(ScoredTarget {
                document_id: target.document_id.clone(),
                match_kind: target.match_kind,
                base,
                similarity,
                score,
            });
        }

        let decision = decide(scored, &self.policy);
        debug!(text = %candidate.source_text, ?decision, "candidate resolved");
        decision
    }
}

/// The blank-line delimited paragraph containing `span`
pub fn paragraph_around(body: &str, span: Span) -> &str {
    let start = body[..span.start].rfind("\n\n").map_or(0, |i| i + 2);
    let end = body[span.end..]
        .find("\n\n")
        .map_or(body.len(), |i| span.end + i);
    &body[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(id: &str, kind: MatchKind, score: f64) -> ScoredTarget {
        ScoredTarget {
            document_id: id.to_string(),
            match_kind: kind,
            base: score,
            similarity: None,
            score,
        }
    }

    #[test]
    fn test_nothing_clears_threshold() {
        let decision = decide(vec![target("A", MatchKind::Variant, 0.5)], &ScoringPolicy::default());
        assert_eq!(decision, Decision::Discarded);
    }

    #[test]
    fn test_single_clear_target_accepted() {
        let decision = decide(
            vec![target("A", MatchKind::Synonym, 0.8), target("B", MatchKind::Synonym, 0.6)],
            &ScoringPolicy::default(),
        );
        assert_eq!(decision.accepted().unwrap().document_id, "A");
        assert!(matches!(decision, Decision::Accepted { ambiguous: false, .. }));
    }

    #[test]
    fn test_ambiguity_automatic_picks_top() {
        let targets = vec![target("D", MatchKind::Synonym, 0.70), target("C", MatchKind::Synonym, 0.72)];
        let decision = decide(targets, &ScoringPolicy::default());
        match decision {
            Decision::Accepted { target, ambiguous } => {
                assert_eq!(target.document_id, "C");
                assert!(ambiguous);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ambiguity_interactive_shortlists() {
        let policy = ScoringPolicy {
            mode: ResolveMode::Interactive,
            ..ScoringPolicy::default()
        };
        let targets = vec![target("D", MatchKind::Synonym, 0.70), target("C", MatchKind::Synonym, 0.72)];
        match decide(targets, &policy) {
            Decision::AwaitingUser { shortlist } => {
                let ids: Vec<_> = shortlist.iter().map(|t| t.document_id.as_str()).collect();
                assert_eq!(ids, vec!["C", "D"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_exact_beats_close_variant_without_ambiguity() {
        let decision = decide(
            vec![target("V", MatchKind::Variant, 0.99), target("E", MatchKind::Exact, 1.0)],
            &ScoringPolicy {
                mode: ResolveMode::Interactive,
                ..ScoringPolicy::default()
            },
        );
        assert!(matches!(decision, Decision::Accepted { ambiguous: false, .. }));
        assert_eq!(decision.accepted().unwrap().document_id, "E");
    }

    #[test]
    fn test_margin_boundary_counts_as_ambiguous() {
        let decision = decide(
            vec![target("A", MatchKind::Variant, 0.75), target("B", MatchKind::Variant, 0.70)],
            &ScoringPolicy::default(),
        );
        assert!(matches!(decision, Decision::Accepted { ambiguous: true, .. }));
    }

    #[test]
    fn test_tie_broken_by_id() {
        let decision = decide(
            vec![target("b", MatchKind::Variant, 0.8), target("a", MatchKind::Variant, 0.8)],
            &ScoringPolicy::default(),
        );
        assert_eq!(decision.accepted().unwrap().document_id, "a");
    }

    #[test]
    fn test_choose_settles_pending() {
        let mut decision = Decision::AwaitingUser {
            shortlist: vec![target("C", MatchKind::Synonym, 0.72), target("D", MatchKind::Synonym, 0.7)],
        };
        assert!(!decision.choose(Some("X")));
        assert!(decision.choose(Some("D")));
        assert_eq!(decision.accepted().unwrap().document_id, "D");
        assert!(!decision.choose(None));
    }

    #[test]
    fn test_paragraph_around() {
        let body = "first para\n\nsecond has API inside\nstill second\n\nthird";
        let start = body.find("API").unwrap();
        assert_eq!(
            paragraph_around(body, Span::new(start, start + 3)),
            "second has API inside\nstill second"
        );
    }
}
