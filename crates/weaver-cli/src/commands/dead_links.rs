use crate::cli::{OutputFormat, VaultArgs};
use crate::output::render_dead_links;
use anyhow::Result;
use colored::Colorize;
use weaver_config::Config;
use weaver_core::find_dead_links;

/// Report broken links. Exits non-zero when any are found.
pub fn execute(vault: VaultArgs, format: OutputFormat, config: &Config) -> Result<bool> {
    let (corpus, load_errors) = super::load_vault(&vault, config)?;
    for err in &load_errors {
        eprintln!("{} {}: {}", "not loaded:".red(), err.path.display(), err.message);
    }

    let dead = find_dead_links(&corpus, config.linking.alias_compare);
    render_dead_links(&dead, &vault.path, format)?;
    Ok(dead.is_empty())
}
