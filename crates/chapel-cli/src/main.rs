mod cli;
mod commands;
mod error;
mod metadata;
mod output;

use std::process::ExitCode;

use chapel_core::{ApiConfig, ModeSettings};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = ApiConfig::from_env();
    init_tracing(config.settings());

    match run(&cli, config).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli, config: ApiConfig) -> Result<ExitCode, CliError> {
    let envelope = commands::run(cli, config).await?;
    output::render(&envelope, cli.pretty)?;

    if !envelope.errors.is_empty() {
        return Ok(ExitCode::from(3));
    }
    Ok(ExitCode::SUCCESS)
}

/// Logs go to stderr so stdout stays a single JSON document.
fn init_tracing(settings: ModeSettings) {
    let default_level = if settings.enable_logging { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
