//! Run report
//!
//! Everything a linking run decided, in a serializable shape. Renderers
//! (console, JSON, CSV) live in the CLI.

use crate::edit::{AliasAddition, TextReplacement};
use crate::engine::{Analysis, Engine};
use crate::matcher::LinkCandidate;
use crate::planner::{Plan, SkippedAlias, SkippedLink};
use crate::registry::RegistryCollision;
use crate::scorer::{Decision, ScoredTarget};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use weaver_parser::Span;

/// A file that could not be loaded into the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadError {
    pub path: PathBuf,
    pub message: String,
}

/// A document whose edits could not be applied or written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteError {
    pub document_id: String,
    pub message: String,
}

/// A planned replacement with its file line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditRecord {
    pub line: usize,
    #[serde(flatten)]
    pub replacement: TextReplacement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingLink {
    pub span: Span,
    pub line: usize,
    pub source_text: String,
    pub shortlist: Vec<ScoredTarget>,
}

/// A link made although a close rival existed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmbiguousLink {
    pub span: Span,
    pub line: usize,
    pub source_text: String,
    pub chosen: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticRecord {
    pub line: usize,
    pub offset: usize,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentReport {
    pub document_id: String,
    pub path: PathBuf,
    pub candidates_found: usize,
    pub links_applied: usize,
    pub edits: Vec<EditRecord>,
    pub pending: Vec<PendingLink>,
    pub ambiguous: Vec<AmbiguousLink>,
    pub skipped_links: Vec<SkippedLink>,
    pub diagnostics: Vec<DiagnosticRecord>,
}

impl DocumentReport {
    /// Nothing to show for this document
    pub fn is_quiet(&self) -> bool {
        self.candidates_found == 0 && self.diagnostics.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub documents_scanned: usize,
    pub documents_changed: usize,
    pub candidates: usize,
    pub links_applied: usize,
    pub aliases_added: usize,
    pub aliases_skipped: usize,
    pub pending: usize,
    pub skipped_links: usize,
    pub diagnostics: usize,
    pub collisions: usize,
    pub load_errors: usize,
    pub write_errors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub documents: Vec<DocumentReport>,
    pub alias_additions: Vec<AliasAddition>,
    pub skipped_aliases: Vec<SkippedAlias>,
    pub collisions: Vec<RegistryCollision>,
    pub load_errors: Vec<LoadError>,
    pub write_errors: Vec<WriteError>,
    pub backend_unavailable: bool,
    pub summary: RunSummary,
}

impl RunReport {
    pub fn build(engine: &Engine, analysis: &Analysis, plan: &Plan, dry_run: bool) -> Self {
        let corpus = engine.corpus();
        let plans: HashMap<&str, _> = plan
            .documents
            .iter()
            .map(|p| (p.document_id.as_str(), p))
            .collect();

        let documents = analysis
            .documents
            .iter()
            .filter_map(|da| {
                let doc = corpus.get(&da.document_id)?;
                let doc_plan = plans.get(da.document_id.as_str());
                let line = |c: &LinkCandidate| doc.line_of(c.span.start);

                let mut pending = Vec::new();
                let mut ambiguous = Vec::new();
                for sc in &da.candidates {
                    match &sc.decision {
                        Decision::AwaitingUser { shortlist } => pending.push(PendingLink {
                            span: sc.candidate.span,
                            line: line(&sc.candidate),
                            source_text: sc.candidate.source_text.clone(),
                            shortlist: shortlist.clone(),
                        }),
                        Decision::Accepted { target, ambiguous: true } => ambiguous.push(AmbiguousLink {
                            span: sc.candidate.span,
                            line: line(&sc.candidate),
                            source_text: sc.candidate.source_text.clone(),
                            chosen: target.document_id.clone(),
                        }),
                        _ => {}
                    }
                }

                let edits: Vec<EditRecord> = doc_plan
                    .map(|p| {
                        p.replacements
                            .iter()
                            .map(|r| EditRecord {
                                line: doc.line_of(r.span.start),
                                replacement: r.clone(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Some(DocumentReport {
                    document_id: da.document_id.clone(),
                    path: doc.path().to_path_buf(),
                    candidates_found: da.candidates.len(),
                    links_applied: edits.len(),
                    edits,
                    pending,
                    ambiguous,
                    skipped_links: doc_plan.map(|p| p.skipped_links.clone()).unwrap_or_default(),
                    diagnostics: da
                        .zones
                        .diagnostics
                        .iter()
                        .map(|d| DiagnosticRecord {
                            line: doc.line_of(d.offset),
                            offset: d.offset,
                            message: d.kind.describe(),
                        })
                        .collect(),
                })
            })
            .collect();

        let mut report = Self {
            dry_run,
            documents,
            alias_additions: plan.alias_additions.clone(),
            skipped_aliases: plan.skipped_aliases.clone(),
            collisions: engine.registry().collisions().to_vec(),
            load_errors: Vec::new(),
            write_errors: Vec::new(),
            backend_unavailable: engine.backend_lost(),
            summary: RunSummary::default(),
        };
        report.summarize();
        report
    }

    pub fn with_load_errors(mut self, errors: Vec<LoadError>) -> Self {
        self.load_errors = errors;
        self.summarize();
        self
    }

    pub fn record_write_error(&mut self, document_id: impl Into<String>, message: impl Into<String>) {
        self.write_errors.push(WriteError {
            document_id: document_id.into(),
            message: message.into(),
        });
        self.summarize();
    }

    /// Recompute summary counters from the report body
    pub fn summarize(&mut self) {
        let mut changed: BTreeSet<&str> = self
            .documents
            .iter()
            .filter(|d| d.links_applied > 0)
            .map(|d| d.document_id.as_str())
            .collect();
        changed.extend(self.alias_additions.iter().map(|a| a.document_id.as_str()));
        for failed in &self.write_errors {
            changed.remove(failed.document_id.as_str());
        }

        self.summary = RunSummary {
            documents_scanned: self.documents.len(),
            documents_changed: changed.len(),
            candidates: self.documents.iter().map(|d| d.candidates_found).sum(),
            links_applied: self.documents.iter().map(|d| d.links_applied).sum(),
            aliases_added: self.alias_additions.len(),
            aliases_skipped: self.skipped_aliases.len(),
            pending: self.documents.iter().map(|d| d.pending.len()).sum(),
            skipped_links: self.documents.iter().map(|d| d.skipped_links.len()).sum(),
            diagnostics: self.documents.iter().map(|d| d.diagnostics.len()).sum(),
            collisions: self.collisions.len(),
            load_errors: self.load_errors.len(),
            write_errors: self.write_errors.len(),
        };
    }
}
