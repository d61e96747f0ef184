//! Weaver note parser
//!
//! The file-format layer for the Weaver auto-linker. This crate provides:
//! - Frontmatter detection, parsing (YAML `---` / TOML `+++`) and re-rendering
//! - Obsidian-style link scanning: `[[wikilinks]]`, `[inline](links)` and
//!   `[key|alias]: target "title"` reference definitions
//! - Byte-exact spans for everything it finds, so callers can rewrite text
//!   without re-parsing

pub mod error;
pub mod frontmatter;
pub mod links;
pub mod note;
pub mod types;

pub use error::{ParserError, ParserResult};
pub use frontmatter::{locate_frontmatter, split_frontmatter, FrontmatterBounds};
pub use links::{scan_links, LinkScan, MalformedKind, MalformedLink};
pub use note::{NoteFile, DEFAULT_MAX_FILE_SIZE};
pub use types::{
    value_kind, Frontmatter, FrontmatterFormat, InlineLink, ReferenceDefinition, Span, Wikilink,
    ALIAS_KEYS,
};
