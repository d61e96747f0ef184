//! Dead link detection
//!
//! Wikilinks are resolved against every document's id, title, aliases and
//! file stem. Links to attachments such as images and PDFs are not
//! checked. Empty inline URLs and empty reference-definition targets are
//! reported as well.

use crate::document::{Corpus, Document};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;
use weaver_config::AliasCompare;
use weaver_parser::Span;

const MAX_SUGGESTIONS: usize = 3;
const PREFIX_CHARS: usize = 4;

const ATTACHMENT_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "pdf", "mp3", "mp4", "wav", "ogg", "webm",
    "mov", "canvas", "excalidraw", "csv", "zip",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadLinkKind {
    MissingTarget,
    EmptyUrl,
    EmptyReference,
}

impl DeadLinkKind {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::MissingTarget => "target does not exist",
            Self::EmptyUrl => "empty link URL",
            Self::EmptyReference => "empty reference target",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadLink {
    pub document_id: String,
    pub path: PathBuf,
    pub line: usize,
    pub span: Span,
    pub kind: DeadLinkKind,
    /// Link target as written
    pub target: String,
    pub suggestions: Vec<String>,
}

/// Resolves link targets to document ids
#[derive(Debug, Clone)]
pub struct LinkResolver {
    names: HashMap<String, String>,
    ids: Vec<String>,
    compare: AliasCompare,
}

impl LinkResolver {
    pub fn new(corpus: &Corpus, compare: AliasCompare) -> Self {
        let key = |s: &str| normalize_key(s, compare);
        let mut names = HashMap::new();

        for doc in corpus.iter() {
            let stem = doc.note().stem();
            let all = [doc.id.as_str(), stem.as_str()]
                .into_iter()
                .chain(doc.names());
            for name in all {
                // First document to claim a name keeps it
                names.entry(key(name)).or_insert_with(|| doc.id.clone());
            }
        }

        Self {
            names,
            ids: corpus.iter().map(|d| d.id.clone()).collect(),
            compare,
        }
    }

    /// Document id a wikilink target points at.
    ///
    /// `None` for unknown targets and for attachments; use
    /// [`is_checked`](Self::is_checked) to tell them apart.
    pub fn resolve(&self, target: &str) -> Option<&str> {
        let name = note_name(target)?;
        self.names.get(&normalize_key(name, self.compare)).map(String::as_str)
    }

    /// Whether `target` names a note rather than an attachment or a
    /// heading in the same document
    pub fn is_checked(target: &str) -> bool {
        note_name(target).is_some()
    }

    /// Up to three ids the author may have meant
    pub fn suggest(&self, target: &str) -> Vec<String> {
        let Some(name) = note_name(target) else {
            return Vec::new();
        };
        let lower = name.to_lowercase();
        let mut out: Vec<String> = Vec::new();

        let mut insensitive: Vec<&String> = self
            .names
            .iter()
            .filter(|(k, _)| k.to_lowercase() == lower)
            .map(|(_, id)| id)
            .collect();
        insensitive.sort();
        for id in insensitive {
            if !out.contains(id) {
                out.push(id.clone());
            }
        }

        let prefix: String = lower.chars().take(PREFIX_CHARS).collect();
        if prefix.chars().count() == PREFIX_CHARS {
            for id in &self.ids {
                if out.len() >= MAX_SUGGESTIONS {
                    break;
                }
                if id.to_lowercase().starts_with(&prefix) && !out.contains(id) {
                    out.push(id.clone());
                }
            }
        }

        out.truncate(MAX_SUGGESTIONS);
        out
    }
}

fn normalize_key(name: &str, compare: AliasCompare) -> String {
    match compare {
        AliasCompare::CaseInsensitive => name.trim().to_lowercase(),
        AliasCompare::Exact => name.trim().to_string(),
    }
}

/// Note name inside a wikilink target: the last path segment without a
/// `.md` extension. `None` for attachments and same-document headings.
fn note_name(target: &str) -> Option<&str> {
    let target = target.trim();
    let name = target.rsplit('/').next().unwrap_or(target);
    if name.is_empty() {
        return None;
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case("md") => Some(stem),
        Some((_, ext)) if is_attachment_extension(ext) => None,
        _ => Some(name),
    }
}

fn is_attachment_extension(ext: &str) -> bool {
    ATTACHMENT_EXTENSIONS.iter().any(|a| ext.eq_ignore_ascii_case(a))
}

/// Dead links in one document
pub fn document_dead_links(doc: &Document, resolver: &LinkResolver) -> Vec<DeadLink> {
    let links = doc.note().links();
    let mut out = Vec::new();

    let mut push = |span: Span, kind: DeadLinkKind, target: &str, suggestions: Vec<String>| {
        out.push(DeadLink {
            document_id: doc.id.clone(),
            path: doc.path().to_path_buf(),
            line: doc.line_of(span.start),
            span,
            kind,
            target: target.to_string(),
            suggestions,
        });
    };

    for link in &links.wikilinks {
        if LinkResolver::is_checked(&link.target) && resolver.resolve(&link.target).is_none() {
            push(
                link.span,
                DeadLinkKind::MissingTarget,
                &link.target,
                resolver.suggest(&link.target),
            );
        }
    }
    for link in &links.inline_links {
        if link.url.trim().is_empty() {
            push(link.span, DeadLinkKind::EmptyUrl, &link.text, Vec::new());
        }
    }
    for def in &links.reference_definitions {
        if def.target.trim().is_empty() {
            push(def.span, DeadLinkKind::EmptyReference, &def.key, Vec::new());
        }
    }

    out.sort_by_key(|d| d.span.start);
    out
}

/// Dead links across the corpus, in corpus order
pub fn find_dead_links(corpus: &Corpus, compare: AliasCompare) -> Vec<DeadLink> {
    let resolver = LinkResolver::new(corpus, compare);
    let found: Vec<DeadLink> = corpus
        .documents()
        .par_iter()
        .flat_map_iter(|doc| document_dead_links(doc, &resolver))
        .collect();
    debug!(dead = found.len(), "dead link scan complete");
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Corpus {
        Corpus::new(vec![
            Document::parse("Rust.md", "---\naliases: [rustlang]\n---\nA language.\n"),
            Document::parse("Rustacean.md", "Crab people."),
            Document::parse(
                "index.md",
                "See [[Rust]], [[rustlang]], [[Rust.md]] and [[lang/Rust]].\n\
                 Broken: [[Rusty]] and [[Nowhere]].\n\
                 Image ![[diagram.png]] and heading [[#Intro]].\n\
                 Empty [click]() here.\n\
                 [ref]: \n",
            ),
        ])
    }

    #[test]
    fn test_known_names_resolve() {
        let resolver = LinkResolver::new(&corpus(), AliasCompare::CaseInsensitive);
        assert_eq!(resolver.resolve("Rust"), Some("Rust"));
        assert_eq!(resolver.resolve("RUSTLANG"), Some("Rust"));
        assert_eq!(resolver.resolve("folder/Rust.md"), Some("Rust"));
        assert_eq!(resolver.resolve("Missing"), None);
    }

    #[test]
    fn test_exact_compare_is_case_sensitive() {
        let resolver = LinkResolver::new(&corpus(), AliasCompare::Exact);
        assert_eq!(resolver.resolve("rust"), None);
        assert_eq!(resolver.suggest("rust"), vec!["Rust", "Rustacean"]);
    }

    #[test]
    fn test_attachments_and_headings_are_not_checked() {
        assert!(!LinkResolver::is_checked("diagram.png"));
        assert!(!LinkResolver::is_checked(""));
        assert!(LinkResolver::is_checked("Note"));
        assert!(LinkResolver::is_checked("Note.md"));
    }

    #[test]
    fn test_find_dead_links() {
        let dead = find_dead_links(&corpus(), AliasCompare::CaseInsensitive);
        let summary: Vec<_> = dead.iter().map(|d| (d.kind, d.target.as_str(), d.line)).collect();
        assert_eq!(
            summary,
            vec![
                (DeadLinkKind::MissingTarget, "Rusty", 2),
                (DeadLinkKind::MissingTarget, "Nowhere", 2),
                (DeadLinkKind::EmptyUrl, "click", 4),
                (DeadLinkKind::EmptyReference, "ref", 5),
            ]
        );
    }

    #[test]
    fn test_prefix_suggestions() {
        let resolver = LinkResolver::new(&corpus(), AliasCompare::CaseInsensitive);
        assert_eq!(resolver.suggest("Rusty"), vec!["Rust", "Rustacean"]);
        assert!(resolver.suggest("Nowhere").is_empty());
    }
}
