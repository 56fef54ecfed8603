mod cache;
mod listing;
mod sources;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chapel_core::{
    ApiConfig, Backoff, FetchConfig, FileStore, KeyValueStore, MemoryStore, ResourceRouter,
    ResourceRouterBuilder, ResourceType, ResourceView, ViewOptions,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::{BackoffKind, CacheCommand, Cli, Command};
use crate::error::CliError;
use crate::metadata::{Envelope, Metadata};

use self::listing::Listing;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }
}

/// Everything a command needs, built once from the global flags.
pub struct Context {
    pub config: ApiConfig,
    pub router: ResourceRouter,
    pub store: Arc<dyn KeyValueStore>,
    pub use_cache: bool,
    pub fallback: Vec<Value>,
}

impl Context {
    pub fn view(&self, resource: ResourceType) -> ResourceView {
        ResourceView::new(
            resource.as_str(),
            self.router.clone(),
            Arc::clone(&self.store),
            self.view_options(),
        )
    }

    pub fn featured_view(&self, resource: ResourceType) -> ResourceView {
        ResourceView::featured(
            resource.as_str(),
            self.router.clone(),
            Arc::clone(&self.store),
            self.view_options(),
        )
    }

    fn view_options(&self) -> ViewOptions {
        let options = ViewOptions::default().with_fallback(self.fallback.clone());
        if self.use_cache {
            options
        } else {
            options.with_cache(false)
        }
    }
}

pub async fn run(cli: &Cli, config: ApiConfig) -> Result<Envelope, CliError> {
    let started = Instant::now();
    let context = build_context(cli, config).await?;
    debug!(
        mode = %context.config.mode,
        use_cache = context.use_cache,
        fallback_items = context.fallback.len(),
        "context ready"
    );

    let (name, result) = match &cli.command {
        Command::Fetch(args) => {
            let params = args.params.iter().cloned().collect();
            ("fetch", listing::run(&context, args.resource, Listing::Fetch(params)).await?)
        }
        Command::Search(args) => (
            "search",
            listing::run(&context, args.resource, Listing::Search(&args.term)).await?,
        ),
        Command::Sort(args) => (
            "sort",
            listing::run(&context, args.resource, Listing::Sort(&args.by)).await?,
        ),
        Command::Refresh(args) => (
            "refresh",
            listing::run(&context, args.resource, Listing::Refresh).await?,
        ),
        Command::Featured(args) => (
            "featured",
            listing::run(&context, args.resource, Listing::Featured).await?,
        ),
        Command::Stats(args) => (
            "stats",
            listing::run(&context, args.resource, Listing::Stats).await?,
        ),
        Command::Sources(args) => ("sources", sources::run(&context, args.resource)?),
        Command::Cache(args) => match &args.command {
            CacheCommand::Clear(clear) => (
                "cache clear",
                cache::clear(&context, clear.resource, &cli.cache_dir).await?,
            ),
            CacheCommand::Purge => ("cache purge", cache::purge(&context, &cli.cache_dir).await?),
        },
    };

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        command = name,
        latency_ms,
        errors = result.errors.len(),
        "command finished"
    );
    let mut meta = Metadata::new(name, context.config.mode, latency_ms);
    for warning in result.warnings {
        meta.push_warning(warning);
    }

    Ok(Envelope {
        meta,
        data: result.data,
        errors: result.errors,
    })
}

async fn build_context(cli: &Cli, config: ApiConfig) -> Result<Context, CliError> {
    if cli.no_cache && matches!(cli.command, Command::Cache(_)) {
        return Err(CliError::Command(String::from(
            "--no-cache cannot be combined with cache commands",
        )));
    }

    let fetch_config = FetchConfig::default()
        .with_timeout(Duration::from_millis(cli.timeout_ms))
        .with_retries(cli.retries)
        .with_backoff(backoff(cli));
    let router = ResourceRouterBuilder::new()
        .with_config(config.clone())
        .with_fetch_config(fetch_config)
        .build();

    // `sources` never touches the cache, so it should not create the directory.
    let needs_disk = !cli.no_cache && !matches!(cli.command, Command::Sources(_));
    let store: Arc<dyn KeyValueStore> = if needs_disk {
        Arc::new(FileStore::open(&cli.cache_dir).await?)
    } else {
        Arc::new(MemoryStore::new())
    };

    let fallback = match &cli.fallback {
        Some(path) => load_fallback(path).await?,
        None => Vec::new(),
    };

    Ok(Context {
        config,
        router,
        store,
        use_cache: !cli.no_cache,
        fallback,
    })
}

fn backoff(cli: &Cli) -> Backoff {
    let delay = Duration::from_millis(cli.retry_delay_ms);
    match cli.backoff {
        BackoffKind::Fixed => Backoff::Fixed { delay },
        BackoffKind::Exponential => Backoff::doubling(delay),
    }
}

async fn load_fallback(path: &Path) -> Result<Vec<Value>, CliError> {
    let contents = tokio::fs::read_to_string(path).await?;
    match serde_json::from_str::<Value>(&contents)? {
        Value::Array(items) => {
            debug!(path = %path.display(), items = items.len(), "loaded fallback items");
            Ok(items)
        }
        _ => Err(CliError::Command(format!(
            "fallback file {} must contain a JSON array",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn backoff_flag_selects_the_delay_strategy() {
        let fixed = Cli::try_parse_from(["chapel", "--retry-delay-ms", "250", "sources", "audio"])
            .expect("valid arguments");
        assert_eq!(backoff(&fixed), Backoff::fixed_ms(250));

        let exponential = Cli::try_parse_from([
            "chapel",
            "--retry-delay-ms",
            "250",
            "--backoff",
            "exponential",
            "sources",
            "audio",
        ])
        .expect("valid arguments");
        assert_eq!(
            backoff(&exponential),
            Backoff::doubling(Duration::from_millis(250))
        );
    }
}
