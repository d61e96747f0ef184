//! Exclusion zone detection
//!
//! Zones are byte ranges of a body that must never be rewritten: header
//! blocks, existing links, reference definition lines, code, template
//! placeholders and (optionally) table rows. Each rule runs independently;
//! the union is sorted and merged so no two zones overlap.
//!
//! Malformed constructs become zero-length zones at their opening offset.
//! A zero-length zone at `p` blocks every span that strictly contains `p`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use weaver_parser::{locate_frontmatter, FrontmatterBounds, LinkScan, MalformedKind, Span};

static TEMPLATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\$\{[^}\n]*\}|\{\{.*?\}\}|<%.*?%>").expect("template pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Header,
    Wikilink,
    InlineLink,
    ReferenceDefinition,
    Table,
    Template,
    Code,
    Malformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Zone {
    pub span: Span,
    pub kind: ZoneKind,
}

/// What a diagnostic reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    UnterminatedHeader,
    UnterminatedWikilink,
    UnclosedBracket,
    UnterminatedFence,
}

impl DiagnosticKind {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::UnterminatedHeader => "header block is never closed",
            Self::UnterminatedWikilink => MalformedKind::UnterminatedWikilink.describe(),
            Self::UnclosedBracket => MalformedKind::UnclosedBracket.describe(),
            Self::UnterminatedFence => MalformedKind::UnterminatedFence.describe(),
        }
    }
}

impl From<MalformedKind> for DiagnosticKind {
    fn from(kind: MalformedKind) -> Self {
        match kind {
            MalformedKind::UnterminatedWikilink => Self::UnterminatedWikilink,
            MalformedKind::UnclosedBracket => Self::UnclosedBracket,
            MalformedKind::UnterminatedFence => Self::UnterminatedFence,
        }
    }
}

/// Malformed construct found while detecting zones
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Byte offset into the body
    pub offset: usize,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneOptions {
    pub exclude_tables: bool,
}

/// Sorted, non-overlapping zones
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ZoneSet {
    zones: Vec<Zone>,
}

impl ZoneSet {
    /// Sort and merge arbitrary zones
    pub fn from_zones(mut zones: Vec<Zone>) -> Self {
        zones.sort_by_key(|z| (z.span.start, z.span.end));

        let mut merged: Vec<Zone> = Vec::with_capacity(zones.len());
        for zone in zones {
            match merged.last_mut() {
                Some(last) if zone.span.start < last.span.end => {
                    last.span.end = last.span.end.max(zone.span.end);
                }
                // Zero-length zones at the same point collapse
                Some(last) if last.span.is_empty() && zone.span == last.span => {}
                _ => merged.push(zone),
            }
        }
        Self { zones: merged }
    }

    /// Whether `span` shares a position with any zone
    pub fn intersects(&self, span: &Span) -> bool {
        let first = self.zones.partition_point(|z| z.span.end <= span.start);
        self.zones[first..]
            .iter()
            .take_while(|z| z.span.start < span.end)
            .any(|z| span.intersects(&z.span))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Zone> {
        self.zones.iter()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneScan {
    pub zones: ZoneSet,
    pub diagnostics: Vec<Diagnostic>,
}

/// Detect zones in `body`
pub fn detect(body: &str, options: ZoneOptions) -> ZoneScan {
    detect_with_links(body, &weaver_parser::scan_links(body), options)
}

/// Detect zones reusing an existing link scan of `body`
pub fn detect_with_links(body: &str, links: &LinkScan, options: ZoneOptions) -> ZoneScan {
    let mut zones = Vec::new();
    let mut diagnostics = Vec::new();

    match locate_frontmatter(body) {
        FrontmatterBounds::Found { end, .. } => zones.push(zone(0, end, ZoneKind::Header)),
        FrontmatterBounds::Unterminated { .. } => {
            zones.push(zone(0, 0, ZoneKind::Malformed));
            diagnostics.push(Diagnostic {
                offset: 0,
                kind: DiagnosticKind::UnterminatedHeader,
            });
        }
        FrontmatterBounds::Absent => {}
    }

    zones.extend(links.wikilinks.iter().map(|l| Zone {
        span: l.span,
        kind: ZoneKind::Wikilink,
    }));
    zones.extend(links.inline_links.iter().map(|l| Zone {
        span: l.span,
        kind: ZoneKind::InlineLink,
    }));
    zones.extend(links.reference_definitions.iter().map(|d| Zone {
        span: d.span,
        kind: ZoneKind::ReferenceDefinition,
    }));
    zones.extend(links.code_spans.iter().map(|&span| Zone {
        span,
        kind: ZoneKind::Code,
    }));
    for m in &links.malformed {
        zones.push(zone(m.offset, m.offset, ZoneKind::Malformed));
        diagnostics.push(Diagnostic {
            offset: m.offset,
            kind: m.kind.into(),
        });
    }

    zones.extend(
        TEMPLATE_RE
            .find_iter(body)
            .map(|m| zone(m.start(), m.end(), ZoneKind::Template)),
    );

    if options.exclude_tables {
        zones.extend(table_rows(body));
    }

    diagnostics.sort_by_key(|d| d.offset);
    ZoneScan {
        zones: ZoneSet::from_zones(zones),
        diagnostics,
    }
}

fn zone(start: usize, end: usize, kind: ZoneKind) -> Zone {
    Zone {
        span: Span::new(start, end),
        kind,
    }
}

fn table_rows(body: &str) -> Vec<Zone> {
    let mut rows = Vec::new();
    let mut start = 0;
    for line in body.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        let trimmed = content.trim();
        if trimmed.starts_with('|') && trimmed.ends_with('|') {
            rows.push(zone(start, start + content.len(), ZoneKind::Table));
        }
        start += line.len();
    }
    rows
}
