use crate::cli::{OutputFormat, VaultArgs};
use crate::output::render_validation;
use crate::vault::VaultScanner;
use anyhow::Result;
use rayon::prelude::*;
use tracing::info;
use weaver_config::Config;
use weaver_core::ValidationReport;
use weaver_parser::NoteFile;

/// Check every note's header. Fails on errors, or on any issue with `strict`.
pub fn execute(
    vault: VaultArgs,
    format: OutputFormat,
    required: &[String],
    strict: bool,
    config: &Config,
) -> Result<bool> {
    let scanner = VaultScanner::new(&vault.path, &config.vault, &vault.include, &vault.exclude)?;
    let files = scanner.scan()?;

    let notes: Vec<_> = files
        .par_iter()
        .map(|relative| {
            let path = scanner.root().join(relative);
            let note = NoteFile::read(&path, config.vault.max_file_size);
            (path, note)
        })
        .collect();

    let report = ValidationReport::build(
        notes.iter().map(|(path, note)| (path.as_path(), note.as_ref())),
        required,
    );
    info!(
        files = report.files_checked,
        errors = report.errors(),
        warnings = report.warnings(),
        "validation complete"
    );

    render_validation(&report, scanner.root(), format)?;
    Ok(report.errors() == 0 && (!strict || report.issues.is_empty()))
}
