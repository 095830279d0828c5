//! Tooling & Integration Layer
//!
//! The `deckgen` command-line surface and the text/JSON rendering of its reports.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands};
