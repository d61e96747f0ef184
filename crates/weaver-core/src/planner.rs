//! Edit planning
//!
//! Turns accepted candidates into position-exact text replacements and the
//! alias additions that keep targets findable by the spelling that was
//! matched. Planning is sequential and deterministic: documents are planned
//! in corpus order and alias requests are merged by a single ledger.

use crate::document::{Corpus, Document};
use crate::edit::{AliasAddition, Edit, TextReplacement};
use crate::matcher::LinkCandidate;
use crate::scorer::ScoredTarget;
use crate::variants::MatchKind;
use crate::zones::ZoneSet;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use weaver_config::{AliasCompare, DisplayPolicy, LinkingConfig};
use weaver_parser::{Span, Wikilink};

/// A candidate with its chosen target
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedLink {
    pub candidate: LinkCandidate,
    pub target: ScoredTarget,
    pub ambiguous: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Span touches an exclusion zone
    ZoneConflict,
    /// A longer or earlier link claimed part of the span
    Overlap,
    /// Per-document link cap reached
    LinkCap,
    /// Target id or display text would not survive as wikilink markup
    ReservedCharacters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedLink {
    pub span: Span,
    pub source_text: String,
    pub target_id: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasSkipReason {
    /// Target already has the maximum number of aliases
    CapReached,
    /// Target header cannot be rewritten
    InvalidHeader,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedAlias {
    pub document_id: String,
    pub alias: String,
    pub requested_by: String,
    pub reason: AliasSkipReason,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerOptions {
    pub max_links_per_document: usize,
    pub max_aliases_per_document: usize,
    pub display: DisplayPolicy,
    pub alias_compare: AliasCompare,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self::from(&LinkingConfig::default())
    }
}

impl From<&LinkingConfig> for PlannerOptions {
    fn from(config: &LinkingConfig) -> Self {
        Self {
            max_links_per_document: config.max_links_per_document,
            max_aliases_per_document: config.max_aliases_per_document,
            display: config.display,
            alias_compare: config.alias_compare,
        }
    }
}

/// Planned edits for one source document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentPlan {
    pub document_id: String,
    /// Sorted by position, non-overlapping
    pub replacements: Vec<TextReplacement>,
    /// Aliases this document's links asked for, before ledger merging
    pub alias_requests: Vec<AliasAddition>,
    pub skipped_links: Vec<SkippedLink>,
}

/// Plan replacements for one document
pub fn plan_document(
    doc: &Document,
    links: Vec<AcceptedLink>,
    zones: &ZoneSet,
    corpus: &Corpus,
    options: &PlannerOptions,
) -> DocumentPlan {
    let mut plan = DocumentPlan {
        document_id: doc.id.clone(),
        ..DocumentPlan::default()
    };
    let skip = |link: &AcceptedLink, reason: SkipReason| SkippedLink {
        span: link.candidate.span,
        source_text: link.candidate.source_text.clone(),
        target_id: link.target.document_id.clone(),
        reason,
    };

    // Zones first, then the longer span wins and ties go to the earlier start
    let mut open = Vec::with_capacity(links.len());
    for link in links {
        if zones.intersects(&link.candidate.span) {
            plan.skipped_links.push(skip(&link, SkipReason::ZoneConflict));
        } else {
            open.push(link);
        }
    }
    open.sort_by_key(|l| (std::cmp::Reverse(l.candidate.span.len()), l.candidate.span.start));

    let mut kept: Vec<AcceptedLink> = Vec::with_capacity(open.len());
    for link in open {
        if kept.iter().any(|k| k.candidate.span.intersects(&link.candidate.span)) {
            plan.skipped_links.push(skip(&link, SkipReason::Overlap));
        } else {
            kept.push(link);
        }
    }
    kept.sort_by_key(|l| l.candidate.span.start);

    for link in kept {
        let Some(target) = corpus.get(&link.target.document_id) else {
            continue;
        };

        let source_text = &link.candidate.source_text;
        let display = display_text(target, source_text, options.display);
        let display = if Wikilink::can_display(&display) {
            display
        } else {
            source_text.clone()
        };
        if !Wikilink::can_target(&target.id) || !Wikilink::can_display(&display) {
            debug!(document = %doc.id, target = %target.id, text = %source_text, "unlinkable name");
            plan.skipped_links.push(skip(&link, SkipReason::ReservedCharacters));
            continue;
        }
        if plan.replacements.len() >= options.max_links_per_document {
            plan.skipped_links.push(skip(&link, SkipReason::LinkCap));
            continue;
        }

        plan.replacements.push(TextReplacement {
            document_id: doc.id.clone(),
            span: link.candidate.span,
            original_text: source_text.clone(),
            replacement_text: Wikilink::markup(&target.id, &display),
        });

        if link.target.match_kind != MatchKind::Exact {
            plan.alias_requests.push(AliasAddition {
                document_id: target.id.clone(),
                new_alias: source_text.clone(),
            });
        }
    }

    if plan.skipped_links.iter().any(|s| s.reason == SkipReason::LinkCap) {
        debug!(
            document = %doc.id,
            cap = options.max_links_per_document,
            "link cap reached"
        );
    }
    plan.skipped_links.sort_by_key(|s| s.span.start);
    plan
}

/// Display text for a link to `target` written as `source_text`
fn display_text(target: &Document, source_text: &str, policy: DisplayPolicy) -> String {
    match policy {
        DisplayPolicy::Source => source_text.to_string(),
        DisplayPolicy::Canonical => {
            if target.aliases.iter().any(|a| a == source_text) || target.title == source_text {
                source_text.to_string()
            } else {
                target.title.clone()
            }
        }
    }
}

/// Corpus-wide merge of alias requests
///
/// Requests are taken in order. A request is dropped when the alias
/// duplicates the target's title, an existing alias or an earlier accepted
/// request; it is skipped and reported when the target is at its alias cap
/// or has an unwritable header.
pub struct AliasLedger<'a> {
    corpus: &'a Corpus,
    compare: AliasCompare,
    max_aliases: usize,
    pending: BTreeMap<String, Vec<String>>,
    accepted: Vec<AliasAddition>,
    skipped: Vec<SkippedAlias>,
}

impl<'a> AliasLedger<'a> {
    pub fn new(corpus: &'a Corpus, compare: AliasCompare, max_aliases: usize) -> Self {
        Self {
            corpus,
            compare,
            max_aliases,
            pending: BTreeMap::new(),
            accepted: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn request(&mut self, requested_by: &str, addition: AliasAddition) {
        let Some(target) = self.corpus.get(&addition.document_id) else {
            return;
        };
        let alias = addition.new_alias.trim();
        if alias.is_empty() {
            return;
        }

        let pending = self.pending.entry(target.id.clone()).or_default();
        let duplicate = target
            .names()
            .chain(pending.iter().map(String::as_str))
            .any(|existing| self.compare.same(existing, alias));
        if duplicate {
            return;
        }

        let reason = if !target.header_is_valid() {
            Some(AliasSkipReason::InvalidHeader)
        } else if target.aliases.len() + pending.len() >= self.max_aliases {
            Some(AliasSkipReason::CapReached)
        } else {
            None
        };

        if let Some(reason) = reason {
            warn!(
                target = %target.id,
                alias = %alias,
                requested_by = %requested_by,
                ?reason,
                "alias addition skipped"
            );
            self.skipped.push(SkippedAlias {
                document_id: target.id.clone(),
                alias: alias.to_string(),
                requested_by: requested_by.to_string(),
                reason,
            });
            return;
        }

        pending.push(alias.to_string());
        self.accepted.push(AliasAddition {
            document_id: target.id.clone(),
            new_alias: alias.to_string(),
        });
    }

    pub fn finish(self) -> (Vec<AliasAddition>, Vec<SkippedAlias>) {
        (self.accepted, self.skipped)
    }
}

/// Edits for a whole run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Plan {
    /// One entry per planned source document, in corpus order
    pub documents: Vec<DocumentPlan>,
    pub alias_additions: Vec<AliasAddition>,
    pub skipped_aliases: Vec<SkippedAlias>,
}

impl Plan {
    /// Build a run plan from per-document plans, merging alias requests
    pub fn assemble(documents: Vec<DocumentPlan>, corpus: &Corpus, options: &PlannerOptions) -> Self {
        let mut ledger = AliasLedger::new(corpus, options.alias_compare, options.max_aliases_per_document);
        for doc in &documents {
            for request in &doc.alias_requests {
                ledger.request(&doc.document_id, request.clone());
            }
        }
        let (alias_additions, skipped_aliases) = ledger.finish();
        Self {
            documents,
            alias_additions,
            skipped_aliases,
        }
    }

    /// All edits grouped by the document they change
    pub fn edits_by_document(&self) -> BTreeMap<String, Vec<Edit>> {
        let mut grouped: BTreeMap<String, Vec<Edit>> = BTreeMap::new();
        for doc in &self.documents {
            if doc.replacements.is_empty() {
                continue;
            }
            grouped
                .entry(doc.document_id.clone())
                .or_default()
                .extend(doc.replacements.iter().cloned().map(Edit::from));
        }
        for addition in &self.alias_additions {
            grouped
                .entry(addition.document_id.clone())
                .or_default()
                .push(Edit::from(addition.clone()));
        }
        grouped
    }

    pub fn replacement_count(&self) -> usize {
        self.documents.iter().map(|d| d.replacements.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.replacement_count() == 0 && self.alias_additions.is_empty()
    }
}
