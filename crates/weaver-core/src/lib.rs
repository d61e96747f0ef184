//! Weaver core
//!
//! The auto-linking engine. Given a corpus of notes it finds plain-text
//! mentions of other notes' titles and aliases, scores them, and plans
//! edits that turn them into `[[wikilinks]]` while leaving code, existing
//! links, headers and other exclusion zones untouched.
//!
//! Every stage is a value transformation:
//!
//! ```text
//! Corpus -> Registry -> MatchIndex -> Analysis -> Plan -> CommitOutcome
//! ```
//!
//! Nothing here touches the filesystem; loading and writing live in the CLI.

pub mod dead_links;
pub mod document;
pub mod edit;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod planner;
pub mod registry;
pub mod report;
pub mod scorer;
pub mod similarity;
pub mod stats;
pub mod validate;
pub mod variants;
pub mod zones;

pub use dead_links::{find_dead_links, DeadLink, DeadLinkKind, LinkResolver};
pub use document::{Corpus, Document};
pub use edit::{AliasAddition, Edit, TextReplacement};
pub use engine::{
    Analysis, CommitOutcome, DocumentAnalysis, Engine, EngineOptions, ScoredCandidate,
};
pub use error::{EngineError, EngineResult};
pub use matcher::{CandidateTarget, LinkCandidate, MatchIndex, MatchOptions};
pub use planner::{
    AcceptedLink, AliasSkipReason, DocumentPlan, Plan, PlannerOptions, SkipReason, SkippedAlias,
    SkippedLink,
};
pub use registry::{NameSource, Registry, RegistryCollision, RegistryEntry};
pub use report::{
    DiagnosticRecord, DocumentReport, EditRecord, LoadError, PendingLink, RunReport, RunSummary,
    WriteError,
};
pub use scorer::{Decision, ResolveMode, ScoredTarget, Scorer, ScoringPolicy, SimilarityRefiner};
pub use similarity::{SimilarityBackend, SimilarityError};
pub use stats::{vault_stats, LinkStats, VaultStats};
pub use validate::{
    validate_note, HeaderIssue, HeaderProblem, IssueSeverity, ValidationReport,
};
pub use variants::{variants, MatchKind, RuleTable, Variant};
pub use zones::{detect, Diagnostic, DiagnosticKind, Zone, ZoneKind, ZoneOptions, ZoneSet};
