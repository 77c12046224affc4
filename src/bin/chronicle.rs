//! Entry point for the `chronicle` command-line tool.
//!
//! Usage:
//!
//! ```text
//! chronicle [--db PATH] [--format text|json] [-v|-q] <command> [args]
//! ```
//!
//! Configuration is read from `~/.config/chronicle/config.toml`,
//! `./chronicle.toml`, and `CHRONICLE_*` environment variables before flags
//! are applied. `CHRONICLE_LOG` overrides the log filter.

use anyhow::Context;
use chronicle::cli::{self, Cli, CliError};
use chronicle::config::ChronicleConfig;
use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CHRONICLE_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let code = error
                .downcast_ref::<CliError>()
                .map_or(1, CliError::exit_code);
            // Nothing useful remains to be done if stderr is gone.
            drop(writeln!(io::stderr(), "chronicle: {error:#}"));
            ExitCode::from(code)
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = ChronicleConfig::load().context("failed to load configuration")?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    cli::execute(cli, config, &mut out).await?;
    out.flush()?;
    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
