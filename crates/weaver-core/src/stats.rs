//! Link statistics
//!
//! Per-document counts plus vault totals. Words are whitespace-separated
//! tokens, except that each CJK character counts as one word since those
//! scripts are written without spaces.

use crate::dead_links::LinkResolver;
use crate::document::{Corpus, Document};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use weaver_config::AliasCompare;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkStats {
    pub document_id: String,
    pub words: usize,
    pub wikilinks: usize,
    pub inline_links: usize,
    pub reference_definitions: usize,
    /// Links per 100 words
    pub density: f64,
    pub unique_targets: usize,
    /// Documents linking here by wikilink
    pub incoming: usize,
}

impl LinkStats {
    pub fn total_links(&self) -> usize {
        self.wikilinks + self.inline_links + self.reference_definitions
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VaultStats {
    pub documents: Vec<LinkStats>,
    pub total_words: usize,
    pub total_links: usize,
    /// Links per 100 words over the whole vault
    pub density: f64,
    /// Documents with no resolvable links in or out
    pub orphans: Vec<String>,
}

/// Count words the way a reader would
pub fn count_words(text: &str) -> usize {
    text.split_whitespace()
        .map(|token| {
            let cjk = token.chars().filter(|&c| is_cjk(c)).count();
            let rest = token.chars().any(|c| !is_cjk(c) && c.is_alphanumeric());
            cjk + usize::from(rest)
        })
        .sum()
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30ff}'
        | '\u{3400}'..='\u{4dbf}'
        | '\u{4e00}'..='\u{9fff}'
        | '\u{f900}'..='\u{faff}'
        | '\u{ac00}'..='\u{d7af}')
}

fn density(links: usize, words: usize) -> f64 {
    if words == 0 {
        0.0
    } else {
        links as f64 * 100.0 / words as f64
    }
}

struct Outgoing {
    stats: LinkStats,
    resolved: BTreeSet<String>,
}

fn document_stats(doc: &Document, resolver: &LinkResolver) -> Outgoing {
    let links = doc.note().links();
    let words = count_words(doc.body());

    let mut targets: HashSet<String> = HashSet::new();
    let mut resolved = BTreeSet::new();
    for link in &links.wikilinks {
        match resolver.resolve(&link.target) {
            Some(id) => {
                targets.insert(id.to_string());
                if id != doc.id {
                    resolved.insert(id.to_string());
                }
            }
            None => {
                targets.insert(link.target.trim().to_string());
            }
        }
    }
    for link in &links.inline_links {
        targets.insert(link.url.clone());
    }
    for def in &links.reference_definitions {
        targets.insert(def.target.clone());
    }
    targets.remove("");

    let total = links.wikilinks.len() + links.inline_links.len() + links.reference_definitions.len();
    Outgoing {
        stats: LinkStats {
            document_id: doc.id.clone(),
            words,
            wikilinks: links.wikilinks.len(),
            inline_links: links.inline_links.len(),
            reference_definitions: links.reference_definitions.len(),
            density: density(total, words),
            unique_targets: targets.len(),
            incoming: 0,
        },
        resolved,
    }
}

/// Statistics for one document, without incoming counts
pub fn link_stats(doc: &Document, resolver: &LinkResolver) -> LinkStats {
    document_stats(doc, resolver).stats
}

/// Statistics for every document plus vault totals
pub fn vault_stats(corpus: &Corpus, compare: AliasCompare) -> VaultStats {
    let resolver = LinkResolver::new(corpus, compare);
    let outgoing: Vec<Outgoing> = corpus
        .documents()
        .par_iter()
        .map(|doc| document_stats(doc, &resolver))
        .collect();

    let mut incoming: HashMap<&str, usize> = HashMap::new();
    for out in &outgoing {
        for id in &out.resolved {
            *incoming.entry(id.as_str()).or_default() += 1;
        }
    }

    let orphans = outgoing
        .iter()
        .filter(|o| o.resolved.is_empty() && !incoming.contains_key(o.stats.document_id.as_str()))
        .map(|o| o.stats.document_id.clone())
        .collect();

    let documents: Vec<LinkStats> = outgoing
        .iter()
        .map(|o| LinkStats {
            incoming: incoming.get(o.stats.document_id.as_str()).copied().unwrap_or(0),
            ..o.stats.clone()
        })
        .collect();

    let total_words = documents.iter().map(|d| d.words).sum();
    let total_links = documents.iter().map(LinkStats::total_links).sum();

    VaultStats {
        documents,
        total_words,
        total_links,
        density: density(total_links, total_words),
        orphans,
    }
}
