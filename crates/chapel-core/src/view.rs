//! Stateful resource listing, the view-layer entry point of the fetch layer.
//!
//! A [`ResourceView`] owns the observable state for one resource type
//! (`data`, `metadata`, `error`, `loading`) and moves through
//! `Idle -> Loading -> Success | Error`. Results are cached by resource type
//! and query parameters; failures fall back to caller-supplied items so a
//! listing never renders empty because of a transport error.

use std::sync::Arc;

use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheLookup, CacheMode, ResourceCache};
use crate::normalize::{validate_resource_data, NormalizedResponse};
use crate::query::QueryParams;
use crate::routing::ResourceRouter;
use crate::stats::ResourceStats;
use crate::store::KeyValueStore;
use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Loading,
    Success,
    Error,
}

pub type SuccessCallback = Box<dyn Fn(&[Value], &Map<String, Value>) + Send + Sync>;
pub type ErrorCallback = Box<dyn Fn(&CoreError) + Send + Sync>;

/// Construction options for a [`ResourceView`].
pub struct ViewOptions {
    /// Fetch once on [`ResourceView::mount`].
    pub auto_fetch: bool,
    /// Items shown when a fetch fails.
    pub fallback_data: Vec<Value>,
    /// Parameters applied to every fetch.
    pub query_params: QueryParams,
    /// `None` enables caching whenever the cache timeout is non-zero.
    pub enable_cache: Option<bool>,
    /// Called after a network fetch succeeds; cache hits do not fire it.
    pub on_success: Option<SuccessCallback>,
    pub on_error: Option<ErrorCallback>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            auto_fetch: true,
            fallback_data: Vec::new(),
            query_params: QueryParams::new(),
            enable_cache: None,
            on_success: None,
            on_error: None,
        }
    }
}

impl ViewOptions {
    pub fn with_fallback(mut self, items: Vec<Value>) -> Self {
        self.fallback_data = items;
        self
    }

    pub fn with_query_params(mut self, params: QueryParams) -> Self {
        self.query_params = params;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.enable_cache = Some(enabled);
        self
    }

    pub fn with_auto_fetch(mut self, enabled: bool) -> Self {
        self.auto_fetch = enabled;
        self
    }

    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[Value], &Map<String, Value>) + Send + Sync + 'static,
    {
        self.on_success = Some(Box::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&CoreError) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(callback));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Cache,
    Network,
}

/// Observable listing state for one resource type.
pub struct ResourceView {
    resource: String,
    router: ResourceRouter,
    cache: ResourceCache,
    options: ViewOptions,
    cache_enabled: bool,
    fallbacks_enabled: bool,

    state: ViewState,
    stale: bool,
    data: Vec<Value>,
    metadata: Map<String, Value>,
    error: Option<String>,
}

impl ResourceView {
    pub fn new(
        resource: impl Into<String>,
        router: ResourceRouter,
        store: Arc<dyn KeyValueStore>,
        options: ViewOptions,
    ) -> Self {
        let settings = router.config().settings();
        let cache = ResourceCache::new(store, settings.cache_timeout);
        let cache_enabled = options.enable_cache.unwrap_or(!cache.is_disabled());

        Self {
            resource: resource.into(),
            router,
            cache,
            options,
            cache_enabled,
            fallbacks_enabled: settings.enable_fallbacks,
            state: ViewState::Idle,
            stale: false,
            data: Vec::new(),
            metadata: Map::new(),
            error: None,
        }
    }

    /// View preset that asks the backend for the single featured item.
    pub fn featured(
        resource: impl Into<String>,
        router: ResourceRouter,
        store: Arc<dyn KeyValueStore>,
        mut options: ViewOptions,
    ) -> Self {
        options.query_params = options
            .query_params
            .merged(&QueryParams::new().with("featured", true).with("limit", 1));
        Self::new(resource, router, store, options)
    }

    /// Replace the cache used by this view.
    pub fn with_cache(mut self, cache: ResourceCache) -> Self {
        if self.options.enable_cache.is_none() {
            self.cache_enabled = !cache.is_disabled();
        }
        self.cache = cache;
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    /// The latest fetch found its cache entry older than the cache timeout.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn data(&self) -> &[Value] {
        &self.data
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.state == ViewState::Loading
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.is_loading() && self.data.is_empty()
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    /// First item of the current listing.
    pub fn featured_item(&self) -> Option<&Value> {
        self.data.first()
    }

    pub fn stats(&self) -> ResourceStats {
        ResourceStats::from_items(&self.data, OffsetDateTime::now_utc().date())
    }

    pub fn cache_key(&self, extra: &QueryParams) -> String {
        self.options.query_params.merged(extra).cache_key(&self.resource)
    }

    /// Initial fetch, when `auto_fetch` is set.
    pub async fn mount(&mut self) -> Option<Vec<Value>> {
        if self.options.auto_fetch {
            Some(self.fetch_data(&QueryParams::new()).await)
        } else {
            None
        }
    }

    /// Drops the cache entry for the base parameters when caching is off.
    pub async fn unmount(&mut self) {
        if !self.cache_enabled {
            self.clear_cache().await;
        }
    }

    pub async fn fetch_data(&mut self, extra: &QueryParams) -> Vec<Value> {
        let mode = if self.cache_enabled {
            CacheMode::Use
        } else {
            CacheMode::Bypass
        };
        self.fetch_with_mode(extra, mode).await
    }

    /// Always performs a network round-trip.
    pub async fn refresh(&mut self, params: &QueryParams) -> Vec<Value> {
        self.fetch_with_mode(params, CacheMode::Refresh).await
    }

    pub async fn search(&mut self, term: &str, extra: &QueryParams) -> Vec<Value> {
        let params = extra.merged(&QueryParams::new().with("search", term));
        self.fetch_data(&params).await
    }

    pub async fn filter(&mut self, filters: &QueryParams) -> Vec<Value> {
        self.fetch_data(filters).await
    }

    pub async fn sort(&mut self, sort_by: &str, extra: &QueryParams) -> Vec<Value> {
        let params = extra.merged(&QueryParams::new().with("sort", sort_by));
        self.fetch_data(&params).await
    }

    /// Removes the cache entry for the base parameters.
    pub async fn clear_cache(&self) {
        let key = self.cache_key(&QueryParams::new());
        if let Err(error) = self.cache.remove(&key).await {
            warn!(resource = %self.resource, %error, "failed to clear cache entry");
        }
    }

    pub async fn fetch_with_mode(&mut self, extra: &QueryParams, mode: CacheMode) -> Vec<Value> {
        self.state = ViewState::Loading;
        self.stale = false;
        self.error = None;

        let params = self.options.query_params.merged(extra);
        let key = params.cache_key(&self.resource);

        match self.load(&params, &key, mode).await {
            Ok((normalized, origin)) => {
                self.data = normalized.items;
                self.metadata = normalized.metadata;
                self.state = ViewState::Success;

                if origin == Origin::Network {
                    if let Some(callback) = &self.options.on_success {
                        callback(&self.data, &self.metadata);
                    }
                }
                self.data.clone()
            }
            Err(failure) => {
                error!(resource = %self.resource, error = %failure, "resource fetch failed");
                self.error = Some(failure.to_string());
                self.state = ViewState::Error;

                let use_fallback = self.fallbacks_enabled && !self.options.fallback_data.is_empty();
                if use_fallback {
                    info!(resource = %self.resource, "using fallback data");
                    self.data = self.options.fallback_data.clone();
                }

                if let Some(callback) = &self.options.on_error {
                    callback(&failure);
                }

                if use_fallback {
                    self.options.fallback_data.clone()
                } else {
                    Vec::new()
                }
            }
        }
    }

    async fn load(
        &mut self,
        params: &QueryParams,
        key: &str,
        mode: CacheMode,
    ) -> Result<(NormalizedResponse, Origin), CoreError> {
        match mode {
            CacheMode::Use => {
                if let Some(normalized) = self.cached(key).await {
                    return Ok((normalized, Origin::Cache));
                }
            }
            CacheMode::Refresh => {
                if let Err(error) = self.cache.remove(key).await {
                    warn!(resource = %self.resource, %error, "failed to drop cache entry before refresh");
                }
            }
            CacheMode::Bypass => {}
        }

        debug!(resource = %self.resource, "fetching fresh data");
        let route = self.router.fetch_resource_data(&self.resource, params).await?;
        let normalized = validate_resource_data(&route.data, &self.resource)?;

        if mode != CacheMode::Bypass && self.cache_enabled {
            if let Err(error) = self.cache.put(key, route.data).await {
                warn!(resource = %self.resource, %error, "failed to write cache entry");
            }
        }

        Ok((normalized, Origin::Network))
    }

    async fn cached(&mut self, key: &str) -> Option<NormalizedResponse> {
        let lookup = match self.cache.lookup(key).await {
            Ok(lookup) => lookup,
            Err(error) => {
                warn!(resource = %self.resource, %error, "cache read failed");
                return None;
            }
        };

        match lookup {
            CacheLookup::Fresh(entry) => match validate_resource_data(&entry.data, &self.resource) {
                Ok(normalized) => {
                    debug!(resource = %self.resource, "using cached data");
                    Some(normalized)
                }
                Err(error) => {
                    warn!(resource = %self.resource, %error, "cached payload is invalid");
                    None
                }
            },
            CacheLookup::Stale(_) => {
                self.stale = true;
                None
            }
            CacheLookup::Miss => None,
        }
    }
}
