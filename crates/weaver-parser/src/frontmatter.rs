//! Frontmatter block detection
//!
//! Only a block starting on the very first line counts. The opening line must
//! be exactly `---` (YAML) or `+++` (TOML) and the block ends at the next line
//! consisting of the same delimiter.

use crate::types::{Frontmatter, FrontmatterFormat};
use std::ops::Range;

/// Where the frontmatter block sits in a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontmatterBounds {
    /// A complete block
    Found {
        format: FrontmatterFormat,
        /// Byte range of the content between the delimiter lines
        inner: Range<usize>,
        /// Byte offset just past the closing delimiter line (including its newline)
        end: usize,
    },
    /// Opening delimiter without a matching close
    Unterminated { format: FrontmatterFormat },
    /// No frontmatter
    Absent,
}

/// Locate the frontmatter block at the start of `text`
pub fn locate_frontmatter(text: &str) -> FrontmatterBounds {
    let mut lines = LineIter::new(text);

    let Some((first, first_next)) = lines.next() else {
        return FrontmatterBounds::Absent;
    };
    let Some(format) = FrontmatterFormat::from_delimiter(first) else {
        return FrontmatterBounds::Absent;
    };
    let delimiter = format.delimiter();
    let inner_start = first_next;

    for (line, next) in lines {
        if line.trim_end() == delimiter {
            let line_start = line.as_ptr() as usize - text.as_ptr() as usize;
            return FrontmatterBounds::Found {
                format,
                inner: inner_start..line_start,
                end: next,
            };
        }
    }

    FrontmatterBounds::Unterminated { format }
}

/// Split `text` into its frontmatter and the remaining body.
///
/// An unterminated block is not frontmatter; the whole text is body.
pub fn split_frontmatter(text: &str) -> (Option<Frontmatter>, &str) {
    match locate_frontmatter(text) {
        FrontmatterBounds::Found { format, inner, end } => {
            let fm = Frontmatter::parse(&text[inner], &text[..end], format);
            (Some(fm), &text[end..])
        }
        FrontmatterBounds::Unterminated { .. } | FrontmatterBounds::Absent => (None, text),
    }
}

/// Iterates lines as `(content_without_terminator, offset_of_next_line)`
pub(crate) struct LineIter<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> LineIter<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for LineIter<'a> {
    type Item = (&'a str, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            return None;
        }
        let rest = &self.text[self.pos..];
        let (line_len, advance) = match rest.find('\n') {
            Some(nl) => (nl, nl + 1),
            None => (rest.len(), rest.len()),
        };
        let line = rest[..line_len].strip_suffix('\r').unwrap_or(&rest[..line_len]);
        self.pos += advance;
        Some((line, self.pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_block_found() {
        let text = "---\ntitle: A\n---\nBody";
        match locate_frontmatter(text) {
            FrontmatterBounds::Found { format, inner, end } => {
                assert_eq!(format, FrontmatterFormat::Yaml);
                assert_eq!(&text[inner], "title: A\n");
                assert_eq!(&text[end..], "Body");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_toml_block_with_crlf() {
        let text = "+++\r\ntitle = \"A\"\r\n+++\r\nBody";
        let (fm, body) = split_frontmatter(text);
        let fm = fm.unwrap();
        assert_eq!(fm.format, FrontmatterFormat::Toml);
        assert_eq!(fm.get_string("title").as_deref(), Some("A"));
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_mismatched_delimiter_does_not_close() {
        let text = "---\ntitle: A\n+++\nBody";
        assert_eq!(
            locate_frontmatter(text),
            FrontmatterBounds::Unterminated {
                format: FrontmatterFormat::Yaml
            }
        );
        let (fm, body) = split_frontmatter(text);
        assert!(fm.is_none());
        assert_eq!(body, text);
    }

    #[test]
    fn test_block_must_start_on_first_line() {
        assert_eq!(locate_frontmatter("\n---\na: b\n---\n"), FrontmatterBounds::Absent);
        assert_eq!(locate_frontmatter("text\n---\n"), FrontmatterBounds::Absent);
        assert_eq!(locate_frontmatter(""), FrontmatterBounds::Absent);
    }

    #[test]
    fn test_empty_block_at_eof() {
        let text = "---\n---";
        match locate_frontmatter(text) {
            FrontmatterBounds::Found { inner, end, .. } => {
                assert!(inner.is_empty());
                assert_eq!(end, text.len());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
