use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::debug;

use weaver_cli::{
    cli::{Cli, Commands},
    commands, logging,
};
use weaver_config::{Config, LoadedConfig};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // `config init` must work even next to a broken config file
    let loaded = match cli.command.vault_root() {
        Some(root) => Some(Config::load(cli.config.as_deref(), root)?),
        None => None,
    };
    let configured = loaded
        .as_ref()
        .map(|l| l.config.logging.level.as_str())
        .unwrap_or("warn");
    logging::init(logging::resolve_level(cli.verbose, cli.log_level, configured));

    if let Some(LoadedConfig { source, .. }) = &loaded {
        debug!(source = %source, "using configuration");
    }
    let config = loaded.map(|l| l.config).unwrap_or_default();

    let ok = match cli.command {
        Commands::Link(args) => commands::link::execute(args, config).await?,
        Commands::DeadLinks { vault, format } => commands::dead_links::execute(vault, format, &config)?,
        Commands::Stats {
            vault,
            format,
            orphans,
        } => {
            commands::stats::execute(vault, format, orphans, &config)?;
            true
        }
        Commands::Validate {
            vault,
            format,
            require,
            strict,
        } => commands::validate::execute(vault, format, &require, strict, &config)?,
        Commands::Config(cmd) => {
            commands::config::execute(cmd, cli.config)?;
            true
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
