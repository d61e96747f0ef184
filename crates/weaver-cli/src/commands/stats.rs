use crate::cli::{OutputFormat, VaultArgs};
use crate::output::render_stats;
use anyhow::Result;
use weaver_config::Config;
use weaver_core::vault_stats;

pub fn execute(vault: VaultArgs, format: OutputFormat, orphans: bool, config: &Config) -> Result<()> {
    let (corpus, _) = super::load_vault(&vault, config)?;
    let stats = vault_stats(&corpus, config.linking.alias_compare);
    render_stats(&stats, orphans, format)
}
