use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::cli::{ConfigCommands, ConfigFormat};
use weaver_config::{Config, CONFIG_FILE_NAME};

/// Execute config subcommand
pub fn execute(cmd: ConfigCommands, explicit: Option<PathBuf>) -> Result<()> {
    match cmd {
        ConfigCommands::Init { path, force } => init(path, force),
        ConfigCommands::Show { vault, format } => show(explicit, vault, format),
    }
}

/// Write a config file holding every default
fn init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    if config_path.exists() && !force {
        println!(
            "{} Config file already exists at: {}",
            "Error:".red().bold(),
            config_path.display()
        );
        println!("Use {} to overwrite", "--force".yellow());
        return Ok(());
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let content = format!(
        "# weave configuration\n# Every key is optional; missing keys use these defaults.\n\n{}",
        Config::default().to_toml_string()?
    );
    std::fs::write(&config_path, content)
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    println!(
        "{} Created config file at: {}",
        "Success:".green().bold(),
        config_path.display()
    );
    Ok(())
}

/// Show the effective configuration
fn show(explicit: Option<PathBuf>, vault: PathBuf, format: ConfigFormat) -> Result<()> {
    let loaded = Config::load(explicit.as_deref(), &vault)?;

    match format {
        ConfigFormat::Toml => {
            println!("# source: {}", loaded.source);
            print!("{}", loaded.config.to_toml_string()?);
        }
        ConfigFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&loaded.config)?);
        }
    }
    Ok(())
}
