use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use chapel_core::ApiConfig;
use chapel_web::{app, AppState};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Serve the chapel API routes and static data files.
#[derive(Debug, Parser)]
#[command(name = "chapel-web", version, about)]
struct Args {
    /// Directory holding `transcripts.json`, `audios.json` and other data files.
    #[arg(long, default_value = "public/data")]
    data_dir: PathBuf,

    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> ExitCode {
    let settings = ApiConfig::from_env().settings();
    let default_level = if settings.enable_logging { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match serve(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "server stopped");
            ExitCode::from(10)
        }
    }
}

async fn serve(args: Args) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(
        addr = %args.bind,
        data_dir = %args.data_dir.display(),
        "chapel-web listening"
    );
    axum::serve(listener, app(AppState::new(args.data_dir))).await
}
