//! Tracing subscriber setup
//!
//! Logs go to stderr so JSON and CSV on stdout stay machine-readable.
//! `RUST_LOG` wins over every other setting when present.

use crate::cli::LogLevel;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

const CRATES: &[&str] = &[
    "weave",
    "weaver_cli",
    "weaver_core",
    "weaver_config",
    "weaver_parser",
    "weaver_llm",
];

/// Pick the effective level: `-v`, then `--log-level`, then the config value
pub fn resolve_level(verbose: bool, flag: Option<LogLevel>, configured: &str) -> LevelFilter {
    if verbose {
        return LevelFilter::DEBUG;
    }
    if let Some(level) = flag {
        return level.into();
    }
    configured.parse().unwrap_or(LevelFilter::WARN)
}

fn directives(level: LevelFilter) -> String {
    CRATES
        .iter()
        .map(|c| format!("{c}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn init(level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(level)));
    // A second init (tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_precedence() {
        assert_eq!(resolve_level(true, Some(LogLevel::Error), "info"), LevelFilter::DEBUG);
        assert_eq!(resolve_level(false, Some(LogLevel::Error), "info"), LevelFilter::ERROR);
        assert_eq!(resolve_level(false, None, "info"), LevelFilter::INFO);
        assert_eq!(resolve_level(false, None, "nonsense"), LevelFilter::WARN);
    }

    #[test]
    fn test_directives_cover_every_crate() {
        let d = directives(LevelFilter::INFO).to_lowercase();
        assert!(d.contains("weaver_core=info"));
        assert!(d.contains("weaver_llm=info"));
    }
}
