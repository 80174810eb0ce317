//! Tooling & Integration Layer
//!
//! Command-line access to the node store and its hierarchy cache, for
//! inspection, scripted edits and cache recovery.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands, OutputFormat};
