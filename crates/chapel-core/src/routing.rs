use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ApiConfig, FetchConfig};
use crate::fetcher::{FetchError, Fetcher};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::query::QueryParams;
use crate::sources::data_sources;

/// Successful routed call.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSuccess {
    pub data: Value,
    pub selected_source: String,
    /// URLs attempted, in order, including the selected one.
    pub source_chain: Vec<String>,
    pub warnings: Vec<String>,
    pub latency_ms: u64,
}

/// Failure of the whole fallback chain.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("no sources available for resource '{resource}'")]
    NoSources { resource: String },

    #[error("failed to fetch {resource} from all sources: {last}")]
    Exhausted {
        resource: String,
        source_chain: Vec<String>,
        last: FetchError,
    },
}

impl RouteError {
    pub fn source_chain(&self) -> &[String] {
        match self {
            Self::NoSources { .. } => &[],
            Self::Exhausted { source_chain, .. } => source_chain,
        }
    }
}

/// Source fallback chain.
///
/// Candidate sources come from [`data_sources`]; they are tried one at a
/// time and the first success is returned without touching the rest.
#[derive(Clone)]
pub struct ResourceRouter {
    config: Arc<ApiConfig>,
    fetch_config: FetchConfig,
    fetcher: Fetcher,
}

impl ResourceRouter {
    pub fn new(config: Arc<ApiConfig>, fetch_config: FetchConfig, client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            fetch_config,
            fetcher: Fetcher::new(client),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn fetch_config(&self) -> &FetchConfig {
        &self.fetch_config
    }

    pub fn sources(&self, resource: &str) -> Vec<String> {
        data_sources(resource, &self.config)
    }

    pub async fn fetch_resource_data(
        &self,
        resource: &str,
        params: &QueryParams,
    ) -> Result<RouteSuccess, RouteError> {
        let started = Instant::now();
        let sources = self.sources(resource);
        if sources.is_empty() {
            return Err(RouteError::NoSources {
                resource: resource.to_owned(),
            });
        }

        let query = params.to_query_string();
        let mut source_chain = Vec::with_capacity(sources.len());
        let mut last_error = None;

        for source in sources {
            let url = format!("{source}{query}");
            source_chain.push(source.clone());

            match self.fetcher.fetch_with_retry(&url, &self.fetch_config).await {
                Ok(data) => {
                    let mut warnings = Vec::new();
                    if source_chain.len() > 1 {
                        warnings.push(format!(
                            "source fallback succeeded with '{source}' after {} failed source(s)",
                            source_chain.len() - 1
                        ));
                    }
                    info!(resource, source = %source, "resource fetched");

                    return Ok(RouteSuccess {
                        data,
                        selected_source: source,
                        source_chain,
                        warnings,
                        latency_ms: elapsed_ms(started),
                    });
                }
                Err(error) => {
                    warn!(resource, source = %source, %error, "source failed");
                    last_error = Some(error);
                }
            }
        }

        match last_error {
            Some(last) => Err(RouteError::Exhausted {
                resource: resource.to_owned(),
                source_chain,
                last,
            }),
            None => Err(RouteError::NoSources {
                resource: resource.to_owned(),
            }),
        }
    }
}

/// Builder for a [`ResourceRouter`].
///
/// ```rust,ignore
/// use chapel_core::ResourceRouterBuilder;
///
/// let router = ResourceRouterBuilder::new().with_env().build();
/// let route = router.fetch_resource_data("audio", &Default::default()).await?;
/// ```
#[derive(Default)]
pub struct ResourceRouterBuilder {
    config: Option<ApiConfig>,
    fetch_config: Option<FetchConfig>,
    client: Option<Arc<dyn HttpClient>>,
}

impl ResourceRouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve [`ApiConfig`] from the process environment.
    pub fn with_env(mut self) -> Self {
        self.config = Some(ApiConfig::from_env());
        self
    }

    pub fn with_config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_fetch_config(mut self, fetch_config: FetchConfig) -> Self {
        self.fetch_config = Some(fetch_config);
        self
    }

    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> ResourceRouter {
        ResourceRouter::new(
            Arc::new(self.config.unwrap_or_default()),
            self.fetch_config.unwrap_or_default(),
            self.client
                .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new())),
        )
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
