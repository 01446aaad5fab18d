//! netview: live per-interface traffic dashboard
//!
//! Entry point for the netview binary. Parses the command line, loads the
//! configuration hierarchy, sets up tracing and hands off to either a
//! one-shot subcommand or the long-running client.
//!
//! # Log Output
//!
//! The dashboard owns the terminal, so its logs are discarded unless
//! `--log-file` is given. Headless mode and subcommands log to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use netview::{cli::Cli, cli_handler, config::ConfigLoader, orchestrator};
use std::path::Path;
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .load(&cli)
        .context("Failed to load configuration")?;

    init_tracing(
        cli.verbose,
        &config.general.log_level,
        cli.log_file.as_deref(),
        cli.is_dashboard(),
        cli.headless,
    )?;

    debug!("Parsed CLI arguments: {:?}", cli);
    debug!("Loaded configuration: {:?}", config);

    match cli.command.clone() {
        Some(command) => cli_handler::handle_command(command, &config),
        None => orchestrator::run(&cli, &config),
    }
}

/// Initialize the tracing subscriber.
///
/// # Verbosity Levels
/// - 0 (default): `RUST_LOG`, then `general.log_level`, then `info` when
///   headless and `warn` otherwise
/// - 1 (-v): Info level
/// - 2 (-vv): Debug level
/// - 3+ (-vvv): Trace level
fn init_tracing(verbose: u8, log_level: &str, log_file: Option<&Path>, dashboard: bool, headless: bool) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let fallback = if headless { "info" } else { "warn" };
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if log_level.is_empty() {
                EnvFilter::new(fallback)
            } else {
                EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new(fallback))
            }
        }),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let registry = tracing_subscriber::registry().with(filter);

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        registry
            .with(fmt::layer().with_ansi(false).with_writer(std::sync::Mutex::new(file)))
            .try_init()
            .context("Failed to initialize tracing subscriber")?;
    } else if dashboard {
        registry
            .with(fmt::layer().with_writer(std::io::sink))
            .try_init()
            .context("Failed to initialize tracing subscriber")?;
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("Failed to initialize tracing subscriber")?;
    }

    Ok(())
}
