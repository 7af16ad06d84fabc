//! Command-line interface definitions for steady.
//!
//! Global options (verbosity, color, error format, config file) come
//! before the subcommand; every subcommand takes the pipeline manifest.
//!
//! # Example
//!
//! ```bash
//! # Run every stale step
//! steady run pipeline.toml
//!
//! # Show which steps would run, as JSON
//! steady status pipeline.toml --output json
//!
//! # Rebuild everything, echoing commands
//! steady -v run pipeline.toml --force
//!
//! # Forget all recorded digests
//! steady clear pipeline.toml
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Incremental execution engine for command-line pipelines.
///
/// steady records SHA-256 digests of every step's executable, inputs and
/// outputs, and re-runs a step only when one of them changed.
#[derive(Debug, Parser)]
#[command(name = "steady")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v echoes commands and logs debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Config file to use instead of the platform default
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Execute every step whose executable, inputs or outputs changed
    Run(RunArgs),
    /// Report which steps would execute, without running anything
    Status(StatusArgs),
    /// Delete the recorded digests of every step in the manifest
    Clear(PipelineArgs),
}

/// Manifest and cache location, shared by all subcommands.
#[derive(Debug, Args)]
pub struct PipelineArgs {
    /// Pipeline manifest (TOML)
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Cache directory (overrides the manifest and config file)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Arguments for the run subcommand.
#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Only report stale steps; execute nothing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Clear the cache first so every step executes
    #[arg(short, long, conflicts_with = "dry_run")]
    pub force: bool,

    /// Summary format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the status subcommand.
#[derive(Debug, Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Summary format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output format for the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON report for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
