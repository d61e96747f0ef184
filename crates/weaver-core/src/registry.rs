//! Name registry
//!
//! Maps every linkable name (title or alias, case preserved) to exactly one
//! document id. Built once per run by folding over the corpus in load order
//! and read-only afterwards.

use crate::document::Corpus;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Where a registered name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameSource {
    Title,
    Alias,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub document_id: String,
    pub source: NameSource,
}

/// Two documents claimed the same name; the later one won
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryCollision {
    pub name: String,
    pub previous_id: String,
    pub winning_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    names: BTreeMap<String, RegistryEntry>,
    collisions: Vec<RegistryCollision>,
}

impl Registry {
    /// Register every title and alias in the corpus
    pub fn build(corpus: &Corpus) -> Self {
        let registry = corpus.iter().fold(Self::default(), |mut registry, doc| {
            let names = std::iter::once((doc.title.as_str(), NameSource::Title))
                .chain(doc.aliases.iter().map(|a| (a.as_str(), NameSource::Alias)));

            for (name, source) in names {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                registry.insert(name, &doc.id, source);
            }
            registry
        });

        for collision in &registry.collisions {
            warn!(
                name = %collision.name,
                previous = %collision.previous_id,
                winner = %collision.winning_id,
                "name claimed by more than one document"
            );
        }
        registry
    }

    fn insert(&mut self, name: &str, id: &str, source: NameSource) {
        let entry = RegistryEntry {
            document_id: id.to_string(),
            source,
        };
        match self.names.get(name) {
            // Title and alias of the same document
            Some(existing) if existing.document_id == id => {}
            Some(existing) => {
                self.collisions.push(RegistryCollision {
                    name: name.to_string(),
                    previous_id: existing.document_id.clone(),
                    winning_id: id.to_string(),
                });
                self.names.insert(name.to_string(), entry);
            }
            None => {
                self.names.insert(name.to_string(), entry);
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&RegistryEntry> {
        self.names.get(name)
    }

    /// All names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegistryEntry)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn collisions(&self) -> &[RegistryCollision] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
