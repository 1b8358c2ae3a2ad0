//! CLI module
//!
//! Command-line interface for running exports.
//!
//! # Commands
//!
//! - `run` - Export every configured environment
//! - `decode` - Inspect a nextPage cursor
//! - `links` - Print the page links a cursor expands to

mod commands;
mod runner;

pub use commands::{Cli, Commands, RunArgs};
pub use runner::Runner;
