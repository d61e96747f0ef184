//! Subcommand implementations

pub mod config;
pub mod dead_links;
pub mod link;
pub mod stats;
pub mod validate;

use crate::cli::VaultArgs;
use crate::vault::{load_corpus, VaultScanner};
use anyhow::Result;
use tracing::info;
use weaver_config::Config;
use weaver_core::{Corpus, LoadError};

/// Scan and load the vault named by `args`
pub(crate) fn load_vault(args: &VaultArgs, config: &Config) -> Result<(Corpus, Vec<LoadError>)> {
    let scanner = VaultScanner::new(&args.path, &config.vault, &args.include, &args.exclude)?;
    let files = scanner.scan()?;
    let (corpus, errors) = load_corpus(scanner.root(), &files, config.vault.max_file_size);
    info!(
        loaded = corpus.len(),
        failed = errors.len(),
        root = %args.path.display(),
        "vault loaded"
    );
    Ok((corpus, errors))
}
