//! Linking pass orchestration
//!
//! A run has four stages:
//!
//! 1. **Build**: registry and match index, once, sequentially
//! 2. **Analyze**: zone detection and matching in parallel across
//!    documents (rayon), then scoring on the async runtime with bounded,
//!    order-preserving concurrency
//! 3. **Plan**: per-document replacements and the alias ledger,
//!    sequentially in corpus order
//! 4. **Commit**: apply each document's edit set all-or-nothing
//!
//! Pending decisions from interactive mode can be settled on the
//! [`Analysis`] between stages 2 and 3. Cancellation is checked between
//! documents, never inside one.

use crate::document::{Corpus, Document};
use crate::error::{EngineError, EngineResult};
use crate::matcher::{LinkCandidate, MatchIndex, MatchOptions};
use crate::planner::{plan_document, AcceptedLink, Plan, PlannerOptions};
use crate::registry::Registry;
use crate::scorer::{paragraph_around, Decision, ResolveMode, Scorer, ScoringPolicy, SimilarityRefiner};
use crate::variants::RuleTable;
use crate::zones::{detect_with_links, ZoneOptions, ZoneScan};
use futures::stream::{self, StreamExt};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use weaver_config::LinkingConfig;
use weaver_parser::{scan_links, Span};

/// Run-wide engine settings
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub linking: LinkingConfig,
    pub variants_enabled: bool,
    pub mode: ResolveMode,
    /// Only these document ids are rewritten; the whole corpus still feeds the registry
    pub targets: Option<BTreeSet<String>>,
}

impl EngineOptions {
    pub fn new(linking: LinkingConfig) -> Self {
        Self {
            linking,
            variants_enabled: true,
            mode: ResolveMode::Automatic,
            targets: None,
        }
    }

    fn match_options(&self) -> MatchOptions {
        MatchOptions {
            min_match_length: self.linking.min_match_length,
            require_word_boundary: self.linking.require_word_boundary,
            variants_enabled: self.variants_enabled,
        }
    }

    fn scoring_policy(&self) -> ScoringPolicy {
        ScoringPolicy {
            threshold: self.linking.confidence_threshold,
            margin: self.linking.ambiguity_margin,
            mode: self.mode,
        }
    }
}

/// A candidate and what was decided for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: LinkCandidate,
    pub decision: Decision,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentAnalysis {
    pub document_id: String,
    #[serde(skip)]
    pub zones: ZoneScan,
    pub candidates: Vec<ScoredCandidate>,
}

/// Output of the analyze stage
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analysis {
    /// In corpus order
    pub documents: Vec<DocumentAnalysis>,
}

impl Analysis {
    pub fn candidate_count(&self) -> usize {
        self.documents.iter().map(|d| d.candidates.len()).sum()
    }

    /// Candidates awaiting a user decision, as `(document id, candidate)`
    pub fn pending(&self) -> impl Iterator<Item = (&str, &ScoredCandidate)> {
        self.documents.iter().flat_map(|d| {
            d.candidates
                .iter()
                .filter(|c| c.decision.is_pending())
                .map(move |c| (d.document_id.as_str(), c))
        })
    }

    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    /// Settle the pending candidate at `span` in `document_id`.
    ///
    /// `choice` is the chosen target id, or `None` to leave the text alone.
    pub fn resolve(&mut self, document_id: &str, span: Span, choice: Option<&str>) -> bool {
        self.documents
            .iter_mut()
            .filter(|d| d.document_id == document_id)
            .flat_map(|d| d.candidates.iter_mut())
            .find(|c| c.candidate.span == span)
            .is_some_and(|c| c.decision.choose(choice))
    }
}

/// Result of applying a plan
#[derive(Debug, Default)]
pub struct CommitOutcome {
    /// Documents with edits applied, in id order
    pub updated: Vec<Document>,
    pub failures: Vec<(String, EngineError)>,
}

/// The auto-linking engine for one run
pub struct Engine {
    corpus: Corpus,
    registry: Registry,
    index: MatchIndex,
    scorer: Scorer,
    options: EngineOptions,
}

impl Engine {
    /// Build the registry and match index over `corpus`
    pub fn new(
        corpus: Corpus,
        rules: &RuleTable,
        options: EngineOptions,
        refiner: Option<SimilarityRefiner>,
    ) -> EngineResult<Self> {
        let registry = Registry::build(&corpus);
        let index = MatchIndex::build(&registry, rules, options.match_options())?;
        let scorer = Scorer::new(options.scoring_policy(), refiner);

        info!(
            documents = corpus.len(),
            names = registry.len(),
            collisions = registry.collisions().len(),
            "engine ready"
        );

        Ok(Self {
            corpus,
            registry,
            index,
            scorer,
            options,
        })
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// True when a similarity backend failed during this run
    pub fn backend_lost(&self) -> bool {
        self.scorer.backend_lost()
    }

    fn selected(&self) -> Vec<&Document> {
        self.corpus
            .iter()
            .filter(|doc| match &self.options.targets {
                Some(ids) => ids.contains(&doc.id),
                None => true,
            })
            .collect()
    }

    /// Detect zones, find and score candidates for every selected document
    pub async fn analyze(&self, cancel: &AtomicBool) -> EngineResult<Analysis> {
        let zone_options = ZoneOptions {
            exclude_tables: self.options.linking.exclude_tables,
        };

        let matched: Vec<Option<(&Document, ZoneScan, Vec<LinkCandidate>)>> = self
            .selected()
            .into_par_iter()
            .map(|doc| {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                let body = doc.body();
                let zones = detect_with_links(body, &scan_links(body), zone_options);
                let candidates = self.index.find_candidates(body, &zones.zones, Some(&doc.id));
                debug!(document = %doc.id, candidates = candidates.len(), "matched");
                Some((doc, zones, candidates))
            })
            .collect();

        if cancel.load(Ordering::Relaxed) {
            return Err(EngineError::Cancelled);
        }
        let matched: Vec<_> = matched.into_iter().flatten().collect();
        for (doc, zones, _) in &matched {
            for diag in &zones.diagnostics {
                warn!(
                    document = %doc.id,
                    line = doc.line_of(diag.offset),
                    problem = diag.kind.describe(),
                    "malformed construct"
                );
            }
        }

        let concurrency = self.options.linking.scoring_concurrency.max(1);
        let scored: Vec<Option<DocumentAnalysis>> = stream::iter(matched)
            .map(|(doc, zones, candidates)| async move {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                let mut out = Vec::with_capacity(candidates.len());
                for candidate in candidates {
                    let context = paragraph_around(doc.body(), candidate.span);
                    let decision = self.scorer.resolve(&candidate, context, &self.corpus).await;
                    out.push(ScoredCandidate { candidate, decision });
                }
                Some(DocumentAnalysis {
                    document_id: doc.id.clone(),
                    zones,
                    candidates: out,
                })
            })
            .buffered(concurrency)
            .collect()
            .await;

        if cancel.load(Ordering::Relaxed) {
            return Err(EngineError::Cancelled);
        }

        let analysis = Analysis {
            documents: scored.into_iter().flatten().collect(),
        };
        info!(
            documents = analysis.documents.len(),
            candidates = analysis.candidate_count(),
            pending = analysis.pending_count(),
            "analysis complete"
        );
        Ok(analysis)
    }

    /// Plan edits from accepted decisions. Pending decisions are not linked.
    pub fn plan(&self, analysis: &Analysis) -> Plan {
        let options = PlannerOptions::from(&self.options.linking);

        let documents = analysis
            .documents
            .iter()
            .filter_map(|da| {
                let doc = self.corpus.get(&da.document_id)?;
                let links = da
                    .candidates
                    .iter()
                    .filter_map(|sc| match &sc.decision {
                        Decision::Accepted { target, ambiguous } => Some(AcceptedLink {
                            candidate: sc.candidate.clone(),
                            target: target.clone(),
                            ambiguous: *ambiguous,
                        }),
                        _ => None,
                    })
                    .collect();
                Some(plan_document(doc, links, &da.zones.zones, &self.corpus, &options))
            })
            .collect();

        let plan = Plan::assemble(documents, &self.corpus, &options);
        info!(
            replacements = plan.replacement_count(),
            aliases = plan.alias_additions.len(),
            skipped_aliases = plan.skipped_aliases.len(),
            "plan complete"
        );
        plan
    }

    /// Apply the plan to in-memory documents, all-or-nothing per document
    pub fn commit(&self, plan: &Plan) -> CommitOutcome {
        let mut outcome = CommitOutcome::default();
        for (id, edits) in plan.edits_by_document() {
            let result = self
                .corpus
                .get(&id)
                .ok_or_else(|| EngineError::UnknownDocument(id.clone()))
                .and_then(|doc| doc.apply(&edits));
            match result {
                Ok(doc) => outcome.updated.push(doc),
                Err(err) => outcome.failures.push((id, err)),
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weaver_config::builtin_rules;

    fn engine(docs: Vec<Document>, options: EngineOptions) -> Engine {
        Engine::new(Corpus::new(docs), &RuleTable::new(&builtin_rules(), 16), options, None).unwrap()
    }

    #[tokio::test]
    async fn test_full_pass_links_and_adds_alias() {
        let engine = engine(
            vec![
                Document::parse("notes.md", "We store rows in a database.\n"),
                Document::parse("DB.md", "---\ntitle: DB\n---\nDatabases.\n"),
            ],
            EngineOptions::new(LinkingConfig::default()),
        );
        let analysis = engine.analyze(&AtomicBool::new(false)).await.unwrap();
        let plan = engine.plan(&analysis);
        let outcome = engine.commit(&plan);
        assert!(outcome.failures.is_empty());

        let notes = outcome.updated.iter().find(|d| d.id == "notes").unwrap();
        assert_eq!(notes.body(), "We store rows in a [[DB]].\n");
        let db = outcome.updated.iter().find(|d| d.id == "DB").unwrap();
        assert_eq!(db.aliases, vec!["database"]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let engine = engine(
            vec![Document::parse("a.md", "text")],
            EngineOptions::new(LinkingConfig::default()),
        );
        let result = engine.analyze(&AtomicBool::new(true)).await;
        assert!(matches!(result, Err(EngineError::Cancelled)));
    }

    #[tokio::test]
    async fn test_target_filter_limits_rewrites() {
        let mut options = EngineOptions::new(LinkingConfig::default());
        options.targets = Some(BTreeSet::from(["b".to_string()]));
        let engine = engine(
            vec![
                Document::parse("a.md", "mentions Rust"),
                Document::parse("b.md", "mentions Rust too"),
                Document::parse("Rust.md", "lang"),
            ],
            options,
        );
        let analysis = engine.analyze(&AtomicBool::new(false)).await.unwrap();
        let ids: Vec<_> = analysis.documents.iter().map(|d| d.document_id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }
}
