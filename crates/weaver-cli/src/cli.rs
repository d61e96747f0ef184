use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tables and colored text
    #[default]
    Console,
    /// One JSON document on stdout
    Json,
    /// CSV rows on stdout
    Csv,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    #[default]
    Toml,
    Json,
}

#[derive(Parser)]
#[command(name = "weave")]
#[command(about = "weave - turn plain-text mentions into wikilinks across a markdown vault")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses the config file value
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to <vault>/.weaver/config.toml or <vault>/weaver.toml)
    #[arg(short = 'C', long, global = true, env = "WEAVER_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find mentions of other notes and link them
    ///
    /// Runs as a dry run unless --execute is given.
    Link(LinkArgs),

    /// Report wikilinks to missing notes and empty link targets
    #[command(name = "dead-links")]
    DeadLinks {
        #[command(flatten)]
        vault: VaultArgs,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Console)]
        format: OutputFormat,
    },

    /// Link counts and density per note
    Stats {
        #[command(flatten)]
        vault: VaultArgs,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Console)]
        format: OutputFormat,

        /// Only list notes with no links in or out
        #[arg(long)]
        orphans: bool,
    },

    /// Check note headers for parse errors, missing keys and malformed aliases
    Validate {
        #[command(flatten)]
        vault: VaultArgs,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Console)]
        format: OutputFormat,

        /// Frontmatter key every note must have (repeatable)
        #[arg(long = "require", value_name = "KEY", default_values = ["id", "title"])]
        require: Vec<String>,

        /// Fail on warnings as well as errors
        #[arg(long)]
        strict: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Vault location and file filters
#[derive(Debug, Clone, Args)]
pub struct VaultArgs {
    /// Vault root directory
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Extra include glob, relative to the vault root (repeatable)
    #[arg(long = "include", value_name = "GLOB")]
    pub include: Vec<String>,

    /// Extra exclude glob, relative to the vault root (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct LinkArgs {
    #[command(flatten)]
    pub vault: VaultArgs,

    /// Write changes to disk (default is a dry run)
    #[arg(short = 'x', long)]
    pub execute: bool,

    /// Treat markdown table rows as protected
    #[arg(long)]
    pub exclude_tables: bool,

    /// Maximum links inserted per note
    #[arg(long, value_name = "N")]
    pub max_links: Option<usize>,

    /// Minimum score for a link
    #[arg(long, value_name = "SCORE")]
    pub confidence: Option<f64>,

    /// Score gap under which two targets count as ambiguous
    #[arg(long, value_name = "SCORE")]
    pub margin: Option<f64>,

    /// Match exact titles and aliases only
    #[arg(long)]
    pub no_variants: bool,

    /// Ask which target to use when a mention is ambiguous
    #[arg(short, long)]
    pub interactive: bool,

    /// Only rewrite these notes (id, file stem or vault-relative path; repeatable)
    #[arg(short, long, value_name = "NOTE")]
    pub target: Vec<String>,

    /// Do not write .bak copies before overwriting
    #[arg(long)]
    pub no_backup: bool,

    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommands {
    /// Write a config file with every default spelled out
    Init {
        /// Where to write (defaults to ./weaver.toml)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration for a vault
    Show {
        /// Vault root directory
        #[arg(default_value = ".")]
        vault: PathBuf,

        #[arg(short = 'f', long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },
}

impl Commands {
    /// Vault root the command works on, when it has one
    pub fn vault_root(&self) -> Option<&PathBuf> {
        match self {
            Commands::Link(args) => Some(&args.vault.path),
            Commands::DeadLinks { vault, .. }
            | Commands::Stats { vault, .. }
            | Commands::Validate { vault, .. } => Some(&vault.path),
            Commands::Config(ConfigCommands::Show { vault, .. }) => Some(vault),
            Commands::Config(ConfigCommands::Init { .. }) => None,
        }
    }
}
