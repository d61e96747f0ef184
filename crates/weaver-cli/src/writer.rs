//! Atomic note writing with optional backups
//!
//! Each file is written through a temp file in the same directory and then
//! renamed over the original. Files are independent, so writes run in
//! parallel; a failure affects only its own file.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use weaver_core::Document;

/// Atomically write `content` to `path`
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("no parent directory for {}", path.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;

    tmp.write_all(content.as_bytes())
        .with_context(|| format!("failed to write temp file for {}", path.display()))?;
    tmp.flush()
        .with_context(|| format!("failed to flush temp file for {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;

    Ok(())
}

/// `<dir>/<stem>.backup_<YYYYMMDD_HHMMSS>.bak`
pub fn backup_path(path: &Path, at: DateTime<Local>) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}.backup_{}.bak", at.format("%Y%m%d_%H%M%S")))
}

fn write_one(doc: &Document, backup_at: Option<DateTime<Local>>) -> Result<()> {
    let path = doc.path();
    let content = doc
        .render()
        .with_context(|| format!("failed to render {}", path.display()))?;

    if let Some(at) = backup_at {
        let backup = backup_path(path, at);
        std::fs::copy(path, &backup)
            .with_context(|| format!("failed to back up {} to {}", path.display(), backup.display()))?;
        debug!(backup = %backup.display(), "backup written");
    }

    atomic_write(path, &content)?;
    debug!(path = %path.display(), "note written");
    Ok(())
}

/// Write every document, returning `(document id, error)` for failures
pub fn write_documents(documents: &[Document], backup: bool) -> Vec<(String, anyhow::Error)> {
    let backup_at = backup.then(Local::now);
    documents
        .par_iter()
        .filter_map(|doc| {
            write_one(doc, backup_at).err().map(|err| {
                warn!(document = %doc.id, error = %err, "write failed");
                (doc.id.clone(), err)
            })
        })
        .collect()
}
