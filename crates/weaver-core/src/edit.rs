//! Edits as data
//!
//! Planning never mutates documents. It produces these values, which are
//! applied in a separate commit step.

use serde::{Deserialize, Serialize};
use weaver_parser::Span;

/// Replace a span of a document body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextReplacement {
    pub document_id: String,
    pub span: Span,
    pub original_text: String,
    pub replacement_text: String,
}

/// Append an alias to a document's alias list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasAddition {
    pub document_id: String,
    pub new_alias: String,
}

/// A single planned change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Edit {
    TextReplacement(TextReplacement),
    AliasAddition(AliasAddition),
}

impl Edit {
    /// Document this edit applies to
    pub fn document_id(&self) -> &str {
        match self {
            Self::TextReplacement(r) => &r.document_id,
            Self::AliasAddition(a) => &a.document_id,
        }
    }
}

impl From<TextReplacement> for Edit {
    fn from(r: TextReplacement) -> Self {
        Self::TextReplacement(r)
    }
}

impl From<AliasAddition> for Edit {
    fn from(a: AliasAddition) -> Self {
        Self::AliasAddition(a)
    }
}
