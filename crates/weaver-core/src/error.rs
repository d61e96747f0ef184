//! Engine error types

use thiserror::Error;
use weaver_parser::ParserError;

/// Errors raised while building, running or committing a linking pass
#[derive(Debug, Error)]
pub enum EngineError {
    /// The match automaton could not be built
    #[error("failed to build match index: {0}")]
    Index(String),

    /// An edit's recorded text no longer matches the document
    #[error("stale edit in {document} at {start}..{end}: expected {expected:?}, found {found:?}")]
    StaleEdit {
        document: String,
        start: usize,
        end: usize,
        expected: String,
        found: String,
    },

    /// Two replacements for one document overlap
    #[error("overlapping edits in {document} at offset {offset}")]
    OverlappingEdits { document: String, offset: usize },

    /// Edit addressed to a different document
    #[error("edit for {expected} applied to {found}")]
    WrongDocument { expected: String, found: String },

    /// Edit references a document not in the corpus
    #[error("unknown document: {0}")]
    UnknownDocument(String),

    /// Frontmatter could not be updated
    #[error(transparent)]
    Parser(#[from] ParserError),

    /// The run was cancelled between documents
    #[error("run cancelled")]
    Cancelled,
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
