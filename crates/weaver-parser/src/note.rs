//! Note file load and render

use crate::error::{ParserError, ParserResult};
use crate::frontmatter::split_frontmatter;
use crate::links::{scan_links, LinkScan};
use crate::types::Frontmatter;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default maximum note size (10 MB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// A markdown note split into frontmatter and body
#[derive(Debug, Clone, PartialEq)]
pub struct NoteFile {
    /// Path to the source file
    pub path: PathBuf,

    /// Parsed frontmatter, if the file has a complete block
    pub frontmatter: Option<Frontmatter>,

    /// Everything after the frontmatter block
    pub body: String,
}

impl NoteFile {
    /// Parse note text.
    ///
    /// Frontmatter that fails to parse is kept verbatim with no properties.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Self {
        let path = path.into();
        let (frontmatter, body) = split_frontmatter(content);

        if let Some(err) = frontmatter.as_ref().and_then(|fm| fm.parse_error()) {
            warn!(path = %path.display(), error = err, "invalid frontmatter, treating as empty");
        }

        Self {
            path,
            frontmatter,
            body: body.to_string(),
        }
    }

    /// Parse raw bytes, rejecting non-UTF-8 content
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: &[u8]) -> ParserResult<Self> {
        let content = std::str::from_utf8(bytes).map_err(|_| ParserError::EncodingError)?;
        Ok(Self::parse(path, content))
    }

    /// Read and parse a note from disk
    pub fn read(path: &Path, max_size: usize) -> ParserResult<Self> {
        let bytes = std::fs::read(path)?;
        if bytes.len() > max_size {
            return Err(ParserError::FileTooLarge {
                size: bytes.len(),
                max: max_size,
            });
        }
        Self::from_bytes(path, &bytes)
    }

    /// File name without extension
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Frontmatter, creating an empty YAML block when the note has none
    pub fn frontmatter_mut(&mut self) -> &mut Frontmatter {
        self.frontmatter.get_or_insert_with(Frontmatter::empty_yaml)
    }

    /// Scan the body for links
    pub fn links(&self) -> LinkScan {
        scan_links(&self.body)
    }

    /// Full file text
    pub fn render(&self) -> ParserResult<String> {
        let header = match &self.frontmatter {
            Some(fm) => fm.render()?,
            None => String::new(),
        };
        let mut out = String::with_capacity(header.len() + self.body.len());
        out.push_str(&header);
        out.push_str(&self.body);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_note_renders_byte_identical() {
        let content = "---\ntitle:   Spaced   \n# comment kept\naliases: [a]\n---\nBody [[x]]\n";
        let note = NoteFile::parse("notes/a.md", content);
        assert_eq!(note.body, "Body [[x]]\n");
        assert_eq!(note.render().unwrap(), content);
    }

    #[test]
    fn test_invalid_yaml_is_kept_verbatim() {
        let content = "---\ntitle: [broken\n---\nBody";
        let note = NoteFile::parse("a.md", content);
        let fm = note.frontmatter.as_ref().unwrap();
        assert!(!fm.is_valid());
        assert!(fm.properties().is_empty());
        assert_eq!(note.body, "Body");
        assert_eq!(note.render().unwrap(), content);
    }

    #[test]
    fn test_alias_added_to_note_without_frontmatter() {
        let mut note = NoteFile::parse("Topic.md", "Just text\n");
        note.frontmatter_mut()
            .set_aliases(&["Alt".to_string()])
            .unwrap();
        assert_eq!(note.render().unwrap(), "---\naliases:\n- Alt\n---\nJust text\n");
    }

    #[test]
    fn test_non_utf8_rejected() {
        let err = NoteFile::from_bytes("bad.md", &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ParserError::EncodingError));
    }

    #[test]
    fn test_stem() {
        let note = NoteFile::parse("vault/20230101120000.md", "");
        assert_eq!(note.stem(), "20230101120000");
    }
}
