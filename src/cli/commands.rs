//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Concurrent exporter for cursor-paginated search APIs
#[derive(Parser, Debug)]
#[command(name = "cursor-fanout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export every configured environment
    Run(RunArgs),

    /// Print the fields of a nextPage cursor as JSON
    Decode {
        /// nextPage link or bare cursor segment
        link: String,
    },

    /// Print the page links generated from a nextPage cursor
    Links {
        /// nextPage link or bare cursor segment
        link: String,

        /// URL whose last path segment is replaced by each cursor
        #[arg(long)]
        base_url: String,

        /// Rows between generated links
        #[arg(long, default_value_t = crate::types::DEFAULT_STRIDE)]
        stride: u64,
    },
}

/// Arguments of the `run` command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Configuration file (YAML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Only export these environments (repeatable)
    #[arg(short, long = "environment")]
    pub environments: Vec<String>,

    /// Override the concurrency cap
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Override the output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}
