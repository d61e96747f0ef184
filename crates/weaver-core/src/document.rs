//! Document model and corpus

use crate::edit::{Edit, TextReplacement};
use crate::error::{EngineError, EngineResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;
use weaver_parser::{NoteFile, ParserResult};

static TIMESTAMP_STEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{14}$").expect("timestamp pattern is valid"));

/// A note with its identity resolved
///
/// `id` is fixed at load. Applying edits returns a new value; documents are
/// never changed in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub title: String,
    /// Ordered, duplicate-free
    pub aliases: Vec<String>,
    note: NoteFile,
    header_lines: usize,
}

impl Document {
    /// Resolve identity from a parsed note.
    ///
    /// The id comes from the `id` property, else a 14-digit timestamp stem,
    /// else the stem itself. The title comes from `title`, else the stem.
    pub fn from_note(note: NoteFile) -> Self {
        let stem = note.stem();
        let fm = note.frontmatter.as_ref();

        let id = fm
            .and_then(|fm| fm.get_string("id"))
            .unwrap_or_else(|| {
                if TIMESTAMP_STEM.is_match(&stem) {
                    stem.clone()
                } else {
                    stem.trim().to_string()
                }
            });
        let title = fm
            .and_then(|fm| fm.get_string("title"))
            .unwrap_or_else(|| stem.clone());
        let aliases = fm.map(|fm| fm.aliases()).unwrap_or_default();
        let header_lines = count_header_lines(&note);

        Self {
            id,
            title,
            aliases,
            note,
            header_lines,
        }
    }

    /// Parse file content into a document
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Self {
        Self::from_note(NoteFile::parse(path, content))
    }

    pub fn body(&self) -> &str {
        &self.note.body
    }

    pub fn path(&self) -> &Path {
        &self.note.path
    }

    pub fn note(&self) -> &NoteFile {
        &self.note
    }

    /// False when the note has a header block that failed to parse
    pub fn header_is_valid(&self) -> bool {
        self.note.frontmatter.as_ref().map_or(true, |fm| fm.is_valid())
    }

    /// Title followed by aliases
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.title.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// 1-based line in the file for a byte offset into the body
    pub fn line_of(&self, body_offset: usize) -> usize {
        let offset = body_offset.min(self.note.body.len());
        self.header_lines + self.note.body.as_bytes()[..offset].iter().filter(|&&b| b == b'\n').count() + 1
    }

    /// Full file text
    pub fn render(&self) -> ParserResult<String> {
        self.note.render()
    }

    /// Apply a complete edit set, producing a new document.
    ///
    /// Either every edit applies or none does: replacements must not
    /// overlap and must still match the body text they were planned
    /// against, and alias additions need a writable header.
    pub fn apply(&self, edits: &[Edit]) -> EngineResult<Document> {
        let mut replacements: Vec<&TextReplacement> = Vec::new();
        let mut new_aliases: Vec<&str> = Vec::new();

        for edit in edits {
            if edit.document_id() != self.id {
                return Err(EngineError::WrongDocument {
                    expected: edit.document_id().to_string(),
                    found: self.id.clone(),
                });
            }
            match edit {
                Edit::TextReplacement(r) => replacements.push(r),
                Edit::AliasAddition(a) => new_aliases.push(&a.new_alias),
            }
        }

        replacements.sort_by_key(|r| (r.span.start, r.span.end));

        let body = self.body();
        let mut out = String::with_capacity(body.len() + replacements.len() * 16);
        let mut cursor = 0;
        for r in replacements {
            if r.span.start < cursor {
                return Err(EngineError::OverlappingEdits {
                    document: self.id.clone(),
                    offset: r.span.start,
                });
            }
            let found = body.get(r.span.start..r.span.end);
            if found != Some(r.original_text.as_str()) {
                return Err(EngineError::StaleEdit {
                    document: self.id.clone(),
                    start: r.span.start,
                    end: r.span.end,
                    expected: r.original_text.clone(),
                    found: found.unwrap_or_default().to_string(),
                });
            }
            out.push_str(&body[cursor..r.span.start]);
            out.push_str(&r.replacement_text);
            cursor = r.span.end;
        }
        out.push_str(&body[cursor..]);

        let mut note = self.note.clone();
        note.body = out;

        let mut aliases = self.aliases.clone();
        let before = aliases.len();
        for alias in new_aliases {
            if !aliases.iter().any(|a| a == alias) {
                aliases.push(alias.to_string());
            }
        }
        if aliases.len() != before {
            note.frontmatter_mut().set_aliases(&aliases)?;
        }

        let header_lines = count_header_lines(&note);
        Ok(Document {
            id: self.id.clone(),
            title: self.title.clone(),
            aliases,
            note,
            header_lines,
        })
    }
}

fn count_header_lines(note: &NoteFile) -> usize {
    note.frontmatter
        .as_ref()
        .and_then(|fm| fm.render().ok())
        .map(|block| block.matches('\n').count())
        .unwrap_or(0)
}

/// All documents of a run, in load order, with unique ids
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    index: HashMap<String, usize>,
}

impl Corpus {
    /// Build a corpus, renaming documents whose id is already taken.
    ///
    /// A duplicate id is replaced by the document's path without extension,
    /// then suffixed with a counter if that is taken too.
    pub fn new(documents: Vec<Document>) -> Self {
        Self::in_vault(Path::new(""), documents)
    }

    /// Like [`Corpus::new`], but a renamed id uses the path relative to
    /// `root`, so it does not depend on where the vault sits on disk.
    pub fn in_vault(root: &Path, documents: Vec<Document>) -> Self {
        let mut index = HashMap::with_capacity(documents.len());
        let mut unique = Vec::with_capacity(documents.len());

        for mut doc in documents {
            if index.contains_key(&doc.id) {
                let original = doc.id.clone();
                let relative = doc.path().strip_prefix(root).unwrap_or(doc.path());
                let base = relative.with_extension("").to_string_lossy().replace('\\', "/");
                let mut candidate = base.clone();
                let mut n = 2;
                while index.contains_key(&candidate) {
                    candidate = format!("{base}-{n}");
                    n += 1;
                }
                warn!(
                    id = %original,
                    path = %doc.path().display(),
                    renamed = %candidate,
                    "duplicate document id"
                );
                doc.id = candidate;
            }
            index.insert(doc.id.clone(), unique.len());
            unique.push(doc);
        }

        Self {
            documents: unique,
            index,
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.index.get(id).map(|&i| &self.documents[i])
    }

    /// Position of a document in load order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }
}
