//! weave CLI library
//!
//! Command-line surface of the auto-linking engine: vault scanning,
//! atomic writes with backups, report rendering and the interactive
//! shortlist prompt. The engine itself lives in `weaver-core`.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod output;
pub mod prompt;
pub mod vault;
pub mod writer;
