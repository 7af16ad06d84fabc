//! steady - Incremental execution engine for command-line pipelines
//!
//! A pipeline is an ordered list of steps, each an external command whose
//! arguments are tagged as inputs, outputs or pass-through. steady records
//! SHA-256 digests of every step's executable, inputs and outputs in an
//! on-disk cache and, on later runs, executes only the steps where one of
//! them changed or an output went missing.

pub mod cache;
pub mod cli;
pub mod config;
pub mod digest;
pub mod engine;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod signal;
pub mod step;

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;

use crate::cache::DigestCache;
use crate::cli::{Cli, Commands, OutputFormat, PipelineArgs};
use crate::config::Config;
use crate::engine::Engine;
use crate::error::ExitCode;
use crate::manifest::Manifest;
use crate::output::{JsonOutput, TextOutput};

/// Run the subcommand selected on the command line.
///
/// Logging is expected to be initialized by the caller.
///
/// # Errors
///
/// Returns an error if the config or manifest cannot be loaded, the
/// manifest is invalid, the cache cannot be cleared, or the summary
/// cannot be written. A failing step is not an error; it is reported
/// through [`ExitCode::StepFailed`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    yansi::whenever(color_condition(cli.no_color));

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    log::debug!("Effective configuration: {:?}", config);

    let verbose = cli.verbose > 0 || config.echo_commands;

    match cli.command {
        Commands::Run(args) => {
            let engine = build_engine(&args.pipeline, &config)?;
            if args.force {
                engine
                    .clear_cache()
                    .context("Failed to clear cache before forced run")?;
            }
            report_run(&engine, args.dry_run, verbose, args.output)
        }
        Commands::Status(args) => {
            let engine = build_engine(&args.pipeline, &config)?;
            report_run(&engine, true, verbose, args.output)
        }
        Commands::Clear(args) => {
            let engine = build_engine(&args, &config)?;
            engine.clear_cache().context("Failed to clear cache")?;
            println!(
                "Cleared cache for {} step(s) in {}",
                engine.len(),
                engine.cache().root().display()
            );
            Ok(ExitCode::Success)
        }
    }
}

/// Load the manifest and register its steps, wired to the Ctrl+C flag.
fn build_engine(args: &PipelineArgs, config: &Config) -> anyhow::Result<Engine> {
    let manifest = Manifest::load(&args.manifest)
        .with_context(|| format!("Failed to load manifest {}", args.manifest.display()))?;

    let cache = match resolve_cache_dir(args, &manifest, config) {
        Some(dir) => DigestCache::new(dir),
        None => DigestCache::with_default_root(),
    };

    let handler = signal::install_handler();
    let engine = manifest
        .build_engine(cache)
        .with_context(|| format!("Invalid manifest {}", args.manifest.display()))?
        .with_shutdown_flag(handler.get_flag());
    Ok(engine)
}

/// Styling only when stdout and stderr are terminals and neither `NO_COLOR`
/// nor `--no-color` asks otherwise, so redirected summaries stay plain.
fn color_condition(no_color: bool) -> yansi::Condition {
    if no_color {
        yansi::Condition::NEVER
    } else {
        yansi::Condition::TTY_AND_COLOR
    }
}

/// Cache root precedence: `--cache-dir`, then the manifest, then the config.
fn resolve_cache_dir(args: &PipelineArgs, manifest: &Manifest, config: &Config) -> Option<PathBuf> {
    args.cache_dir
        .clone()
        .or_else(|| manifest.cache_dir.clone())
        .or_else(|| config.cache_dir.clone())
}

fn report_run(
    engine: &Engine,
    dry_run: bool,
    verbose: bool,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    let report = engine.execute(dry_run, verbose);
    let exit_code = ExitCode::from_report(&report);

    let mut stdout = std::io::stdout().lock();
    match format {
        OutputFormat::Text => TextOutput::new(&report)
            .write_to(&mut stdout)
            .context("Failed to write summary")?,
        OutputFormat::Json => JsonOutput::new(&report, exit_code)
            .write_to(&mut stdout, true)
            .context("Failed to write JSON report")?,
    }
    stdout.flush().context("Failed to flush stdout")?;

    Ok(exit_code)
}
