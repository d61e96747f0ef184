//! Vault enumeration and loading

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;
use weaver_config::VaultConfig;
use weaver_core::{Corpus, Document, LoadError};
use weaver_parser::NoteFile;

/// Finds note files under a vault root
#[derive(Debug)]
pub struct VaultScanner {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
}

fn build_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?);
    }
    Ok(builder.build()?)
}

impl VaultScanner {
    /// Config globs plus any extra ones from the command line
    pub fn new(root: &Path, config: &VaultConfig, include: &[String], exclude: &[String]) -> Result<Self> {
        if !root.is_dir() {
            bail!("vault root {} is not a readable directory", root.display());
        }
        let include: Vec<String> = config.include.iter().chain(include).cloned().collect();
        let exclude: Vec<String> = config.exclude.iter().chain(exclude).cloned().collect();

        Ok(Self {
            root: root.to_path_buf(),
            include: build_set(&include)?,
            exclude: build_set(&exclude)?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn wanted(&self, relative: &Path) -> bool {
        self.include.is_match(relative) && !self.exclude.is_match(relative)
    }

    /// Matching files, sorted by vault-relative path
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root).follow_links(false).into_iter();

        for entry in walker.filter_entry(|e| {
            // Prune excluded directories without descending
            e.depth() == 0
                || e.path()
                    .strip_prefix(&self.root)
                    .map_or(true, |rel| !(e.file_type().is_dir() && self.exclude.is_match(rel)))
        }) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&self.root)?;
            if self.wanted(relative) {
                files.push(relative.to_path_buf());
            }
        }

        files.sort();
        debug!(files = files.len(), root = %self.root.display(), "vault scanned");
        Ok(files)
    }
}

/// Read every file into a corpus. Unreadable files are reported, not fatal.
pub fn load_corpus(root: &Path, files: &[PathBuf], max_file_size: usize) -> (Corpus, Vec<LoadError>) {
    let results: Vec<Result<Document, LoadError>> = files
        .par_iter()
        .map(|relative| {
            let path = root.join(relative);
            NoteFile::read(&path, max_file_size)
                .map(Document::from_note)
                .map_err(|err| {
                    warn!(path = %path.display(), error = %err, "skipping note");
                    LoadError {
                        path: relative.clone(),
                        message: err.to_string(),
                    }
                })
        })
        .collect();

    let mut documents = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(doc) => documents.push(doc),
            Err(err) => errors.push(err),
        }
    }
    (Corpus::in_vault(root, documents), errors)
}

/// Path of a document relative to the vault root, for display
pub fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn vault() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::create_dir_all(dir.path().join(".obsidian")).unwrap();
        fs::write(dir.path().join("b.md"), "B").unwrap();
        fs::write(dir.path().join("a.md"), "A").unwrap();
        fs::write(dir.path().join("sub/c.md"), "C").unwrap();
        fs::write(dir.path().join("image.png"), [0u8, 1]).unwrap();
        fs::write(dir.path().join(".obsidian/workspace.md"), "x").unwrap();
        dir
    }

    #[test]
    fn test_scan_is_sorted_and_filtered() {
        let dir = vault();
        let scanner = VaultScanner::new(dir.path(), &VaultConfig::default(), &[], &[]).unwrap();
        let files = scanner.scan().unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("a.md"), PathBuf::from("b.md"), PathBuf::from("sub/c.md")]
        );
    }

    #[test]
    fn test_extra_exclude() {
        let dir = vault();
        let scanner =
            VaultScanner::new(dir.path(), &VaultConfig::default(), &[], &["sub/**".to_string()]).unwrap();
        assert_eq!(scanner.scan().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(VaultScanner::new(&dir.path().join("nope"), &VaultConfig::default(), &[], &[]).is_err());
    }

    #[test]
    fn test_duplicate_stems_get_vault_relative_ids() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a/Kubernetes.md"), "one").unwrap();
        fs::write(dir.path().join("b/Kubernetes.md"), "two").unwrap();
        fs::write(dir.path().join("n.md"), "We run Kubernetes here.").unwrap();

        let scanner = VaultScanner::new(dir.path(), &VaultConfig::default(), &[], &[]).unwrap();
        let (corpus, errors) = load_corpus(dir.path(), &scanner.scan().unwrap(), 1024);
        assert!(errors.is_empty());
        let ids: Vec<&str> = corpus.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["Kubernetes", "b/Kubernetes", "n"]);
    }

    #[test]
    fn test_bad_utf8_is_a_load_error() {
        let dir = vault();
        fs::write(dir.path().join("bad.md"), [0xffu8, 0xfe, 0x00]).unwrap();
        let files = vec![PathBuf::from("a.md"), PathBuf::from("bad.md")];
        let (corpus, errors) = load_corpus(dir.path(), &files, 1024);
        assert_eq!(corpus.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, PathBuf::from("bad.md"));
    }
}
