//! Configuration sections
//!
//! One struct per `weaver.toml` table. Every field has a default so partial
//! files are valid.

pub mod linking;
pub mod logging;
pub mod similarity;
pub mod variants;
pub mod vault;

pub use linking::*;
pub use logging::*;
pub use similarity::*;
pub use variants::*;
pub use vault::*;
