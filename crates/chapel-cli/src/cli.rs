//! CLI argument definitions for chapel.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fetch` | Fetch a resource listing through the fallback chain |
//! | `search` | Fetch with a `search` term |
//! | `sort` | Fetch with a `sort` order |
//! | `refresh` | Fetch, skipping any cached copy |
//! | `featured` | Fetch the single featured item |
//! | `stats` | Fetch and summarize a listing |
//! | `sources` | Print the source order for a resource |
//! | `cache` | Clear or purge cached listings |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--cache-dir` | `.chapel-cache` | Directory of the persistent cache |
//! | `--timeout-ms` | `10000` | Per-attempt timeout |
//! | `--retries` | `3` | Attempts per source |
//! | `--retry-delay-ms` | `1000` | Pause between attempts |
//! | `--backoff` | `fixed` | `fixed` or `exponential` pauses |
//! | `--no-cache` | `false` | Skip the persistent cache |
//! | `--fallback` | none | JSON array served when every source fails |
//!
//! # Examples
//!
//! ```bash
//! chapel fetch transcripts --param category=Faith --pretty
//! chapel search audio grace
//! NODE_ENV=production chapel sources gallery
//! chapel cache purge
//! ```

use std::path::PathBuf;

use chapel_core::ResourceType;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Fetch ministry resource listings from the API, static files or CDN,
/// whichever answers first.
#[derive(Debug, Parser)]
#[command(
    name = "chapel",
    author,
    version,
    about = "Resilient multi-source resource fetching",
    long_about = "Fetches audio, transcript, article and gallery listings by walking an ordered \
list of sources until one answers. The order depends on NODE_ENV: development prefers the \
API route, production prefers the CDN.\n\
\n\
Use 'chapel <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Directory holding cached listings.
    #[arg(long, global = true, default_value = ".chapel-cache")]
    pub cache_dir: PathBuf,

    /// Per-attempt timeout in milliseconds.
    #[arg(long, global = true, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Attempts per source before moving to the next one.
    #[arg(long, global = true, default_value_t = 3)]
    pub retries: u32,

    /// Pause between attempts in milliseconds.
    #[arg(long, global = true, default_value_t = 1_000)]
    pub retry_delay_ms: u64,

    /// How the pause grows between attempts.
    ///
    /// - fixed: `--retry-delay-ms` every time (default)
    /// - exponential: doubles from `--retry-delay-ms`, jittered, capped at 30 s
    #[arg(long, global = true, value_enum, default_value_t = BackoffKind::Fixed)]
    pub backoff: BackoffKind,

    /// Neither read nor write the persistent cache.
    #[arg(long, global = true, default_value_t = false)]
    pub no_cache: bool,

    /// JSON file with an array of items to serve when every source fails.
    #[arg(long, global = true)]
    pub fallback: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackoffKind {
    Fixed,
    Exponential,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a resource listing.
    ///
    /// # Examples
    ///
    ///   chapel fetch audio
    ///   chapel fetch transcripts --param category=Faith --param page=2
    Fetch(FetchArgs),

    /// Fetch a listing matching a search term.
    Search(SearchArgs),

    /// Fetch a listing in the given order (newest, oldest, popular, title).
    Sort(SortArgs),

    /// Fetch a listing, replacing any cached copy.
    Refresh(ResourceArgs),

    /// Fetch the featured item of a resource.
    Featured(ResourceArgs),

    /// Summarize a listing: totals, categories, speakers, recent items.
    Stats(ResourceArgs),

    /// Show the source order for a resource without fetching.
    Sources(ResourceArgs),

    /// Cache management commands.
    Cache(CacheArgs),
}

#[derive(Debug, Args)]
pub struct ResourceArgs {
    /// audio, transcripts, articles or gallery.
    pub resource: ResourceType,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    pub resource: ResourceType,

    /// Query parameter as key=value; repeatable.
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub resource: ResourceType,

    pub term: String,
}

#[derive(Debug, Args)]
pub struct SortArgs {
    pub resource: ResourceType,

    pub by: String,
}

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Drop the cached unfiltered listing of a resource.
    Clear(ResourceArgs),
    /// Drop every expired or unreadable entry.
    Purge,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in '{raw}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}
