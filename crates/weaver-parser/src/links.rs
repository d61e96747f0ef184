//! Link syntax scanner
//!
//! Single forward pass over a note body that records every explicit link
//! construct with its exact byte span:
//!
//! - `[[target]]`, `[[target|alias]]`, `![[embed]]`
//! - `[text](url)`, `![alt](url)` with brackets matched by depth, so
//!   `[[[[inner]]]outer](url)` is one link
//! - reference definition lines `[key|alias]: target "title"`
//!
//! Fenced code blocks and inline code spans are reported as code and never
//! scanned for links. Constructs that open but never close are reported as
//! malformed at their opening offset; scanning continues after them.

use crate::frontmatter::LineIter;
use crate::types::{InlineLink, ReferenceDefinition, Span, Wikilink};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static REFERENCE_DEFINITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^ {0,3}\[([^\[\]|]+)(?:\|([^\]]+))?\]:[ \t]*(\S*)(?:[ \t]+"([^"]*)")?[ \t]*$"#)
        .expect("reference definition pattern is valid")
});

/// Kind of construct that was opened but never closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedKind {
    /// `[[` with no `]]` on the same line
    UnterminatedWikilink,
    /// `[` never closed on its line
    UnclosedBracket,
    /// Code fence with no closing fence
    UnterminatedFence,
}

impl MalformedKind {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::UnterminatedWikilink => "wikilink is missing its closing ]]",
            Self::UnclosedBracket => "bracket is never closed on its line",
            Self::UnterminatedFence => "code fence is never closed",
        }
    }
}

/// Malformed construct at a byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedLink {
    pub offset: usize,
    /// 1-based line number
    pub line: usize,
    pub kind: MalformedKind,
}

/// Everything found by [`scan_links`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkScan {
    pub wikilinks: Vec<Wikilink>,
    pub inline_links: Vec<InlineLink>,
    pub reference_definitions: Vec<ReferenceDefinition>,
    /// Fenced code blocks and inline code spans, in source order
    pub code_spans: Vec<Span>,
    pub malformed: Vec<MalformedLink>,
}

/// Scan `text` for link constructs
pub fn scan_links(text: &str) -> LinkScan {
    let mut scan = LinkScan::default();
    let mut fence: Option<Fence> = None;
    let mut line_start = 0;

    for (index, (line, next)) in LineIter::new(text).enumerate() {
        let line_no = index + 1;
        let line_end = line_start + line.len();

        if let Some(open) = &fence {
            if open.closed_by(line) {
                scan.code_spans.push(Span::new(open.start, line_end));
                fence = None;
            }
        } else if let Some(open) = Fence::open(line, line_start, line_no) {
            fence = Some(open);
        } else if let Some(def) = parse_reference_definition(line, line_start, line_no) {
            scan.reference_definitions.push(def);
        } else {
            scan_line(text, line_start, line_end, line_no, &mut scan);
        }

        line_start = next;
    }

    if let Some(open) = fence {
        scan.code_spans.push(Span::new(open.start, text.len()));
        scan.malformed.push(MalformedLink {
            offset: open.start,
            line: open.line,
            kind: MalformedKind::UnterminatedFence,
        });
    }

    scan
}

struct Fence {
    marker: u8,
    len: usize,
    start: usize,
    line: usize,
}

impl Fence {
    fn open(line: &str, start: usize, line_no: usize) -> Option<Self> {
        let trimmed = line.trim_start_matches(' ');
        if line.len() - trimmed.len() > 3 {
            return None;
        }
        let marker = *trimmed.as_bytes().first()?;
        if marker != b'`' && marker != b'~' {
            return None;
        }
        let len = trimmed.bytes().take_while(|&b| b == marker).count();
        if len < 3 {
            return None;
        }
        // ```lang`x` is inline code, not a fence
        if marker == b'`' && trimmed[len..].contains('`') {
            return None;
        }
        Some(Self {
            marker,
            len,
            start,
            line: line_no,
        })
    }

    fn closed_by(&self, line: &str) -> bool {
        let trimmed = line.trim_start_matches(' ');
        if line.len() - trimmed.len() > 3 {
            return false;
        }
        let len = trimmed.bytes().take_while(|&b| b == self.marker).count();
        len >= self.len && trimmed[len..].trim().is_empty()
    }
}

fn parse_reference_definition(line: &str, start: usize, line_no: usize) -> Option<ReferenceDefinition> {
    let caps = REFERENCE_DEFINITION_RE.captures(line)?;
    Some(ReferenceDefinition {
        key: caps[1].trim().to_string(),
        alias: caps.get(2).map(|m| m.as_str().trim().to_string()),
        target: caps[3].to_string(),
        title: caps.get(4).map(|m| m.as_str().to_string()),
        span: Span::new(start, start + line.len()),
        line: line_no,
    })
}

fn scan_line(text: &str, start: usize, end: usize, line_no: usize, scan: &mut LinkScan) {
    let bytes = text.as_bytes();
    let mut i = start;

    while i < end {
        match bytes[i] {
            b'\\' => i = (i + 2).min(end),
            b'`' => {
                let run = run_length(bytes, i, end, b'`');
                match find_closing_run(bytes, i + run, end, run) {
                    Some(close) => {
                        scan.code_spans.push(Span::new(i, close + run));
                        i = close + run;
                    }
                    None => i += run,
                }
            }
            b'[' => i = scan_bracket(text, start, i, end, line_no, scan),
            _ => i += 1,
        }
    }
}

/// Handle a `[` at `i`; returns the next scan position
fn scan_bracket(
    text: &str,
    line_start: usize,
    i: usize,
    end: usize,
    line_no: usize,
    scan: &mut LinkScan,
) -> usize {
    let bytes = text.as_bytes();
    let embed = i > line_start && bytes[i - 1] == b'!';
    let span_start = if embed { i - 1 } else { i };
    let close = matching(bytes, i, end, b'[', b']');

    if let Some(close) = close {
        if bytes.get(close + 1) == Some(&b'(') && close + 1 < end {
            if let Some(paren) = matching(bytes, close + 1, end, b'(', b')') {
                scan.inline_links.push(InlineLink {
                    text: text[i + 1..close].to_string(),
                    url: link_destination(&text[close + 2..paren]),
                    span: Span::new(span_start, paren + 1),
                    is_image: embed,
                });
                return paren + 1;
            }
        }
    }

    if bytes.get(i + 1) == Some(&b'[') && i + 1 < end {
        return match text[i + 2..end].find("]]") {
            Some(rel) => {
                let close = i + 2 + rel;
                let inner = &text[i + 2..close];
                if inner.contains('[') || inner.contains(']') {
                    i + 1
                } else {
                    if !inner.trim().is_empty() {
                        scan.wikilinks
                            .push(Wikilink::parse(inner, Span::new(span_start, close + 2), embed));
                    }
                    close + 2
                }
            }
            None => {
                scan.malformed.push(MalformedLink {
                    offset: span_start,
                    line: line_no,
                    kind: MalformedKind::UnterminatedWikilink,
                });
                i + 2
            }
        };
    }

    if close.is_none() {
        scan.malformed.push(MalformedLink {
            offset: i,
            line: line_no,
            kind: MalformedKind::UnclosedBracket,
        });
    }
    i + 1
}

/// Position of the delimiter closing the one at `from`, matched by depth
fn matching(bytes: &[u8], from: usize, end: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut j = from;
    while j < end {
        let b = bytes[j];
        if b == b'\\' {
            j += 2;
            continue;
        }
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(j);
            }
        }
        j += 1;
    }
    None
}

fn run_length(bytes: &[u8], from: usize, end: usize, byte: u8) -> usize {
    bytes[from..end].iter().take_while(|&&b| b == byte).count()
}

fn find_closing_run(bytes: &[u8], from: usize, end: usize, run: usize) -> Option<usize> {
    let mut j = from;
    while j < end {
        if bytes[j] == b'`' {
            let len = run_length(bytes, j, end, b'`');
            if len == run {
                return Some(j);
            }
            j += len;
        } else {
            j += 1;
        }
    }
    None
}

/// Destination part of `(dest "title")`
fn link_destination(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix('<') {
        if let Some(close) = rest.find('>') {
            return rest[..close].to_string();
        }
    }
    raw.split_whitespace().next().unwrap_or("").to_string()
}
