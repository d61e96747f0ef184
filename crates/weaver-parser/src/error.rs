//! Parser error types

use std::io;
use thiserror::Error;

/// Parser error type
#[derive(Debug, Error)]
pub enum ParserError {
    /// IO error reading file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Frontmatter parsing failed
    #[error("Frontmatter parse error: {0}")]
    FrontmatterError(String),

    /// Frontmatter could not be rendered back to text
    #[error("Frontmatter render error: {0}")]
    RenderError(String),

    /// File content is not valid UTF-8
    #[error("Invalid UTF-8 encoding in file")]
    EncodingError,

    /// File exceeds size limit
    #[error("File too large: {size} bytes (max {max} bytes)")]
    FileTooLarge {
        /// Actual file size
        size: usize,
        /// Maximum allowed size
        max: usize,
    },
}

/// Specialized Result type for parser operations
pub type ParserResult<T> = Result<T, ParserError>;

impl ParserError {
    /// Create a frontmatter error
    pub fn frontmatter(msg: impl Into<String>) -> Self {
        Self::FrontmatterError(msg.into())
    }

    /// Create a render error
    pub fn render(msg: impl Into<String>) -> Self {
        Self::RenderError(msg.into())
    }

    /// Check if this error is recoverable (the note can still be processed)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::FrontmatterError(_))
    }
}
