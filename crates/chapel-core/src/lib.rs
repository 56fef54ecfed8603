//! # Chapel Core
//!
//! Resilient multi-source fetching for the site's resource listings
//! (audio messages, transcripts, articles, gallery).
//!
//! ## Overview
//!
//! - **Endpoint registry** mapping each [`ResourceType`] to its API route,
//!   static JSON file and CDN file
//! - **Source prioritization** by [`RuntimeMode`]
//! - **Resilient fetcher** with per-attempt timeout and retry
//! - **Fallback router** that walks sources in order until one answers
//! - **Normalizer** for the three payload shapes backends return
//! - **Resource cache** over an injectable [`KeyValueStore`]
//! - **Resource view**, the stateful listing driven by UI collaborators
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Time-expiring payload cache |
//! | [`config`] | Runtime mode, base URLs, fetch settings |
//! | [`error`] | Core error types |
//! | [`fetcher`] | Timeout + retry for a single URL |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`normalize`] | Payload shape resolution |
//! | [`query`] | Query parameters and cache keys |
//! | [`resource`] | Resource types and endpoint registry |
//! | [`retry`] | Backoff strategies |
//! | [`routing`] | Source fallback chain |
//! | [`sources`] | Source prioritization |
//! | [`stats`] | Listing statistics |
//! | [`store`] | Key-value store capability |
//! | [`view`] | Stateful resource listing |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chapel_core::{MemoryStore, QueryParams, ResourceRouterBuilder, ResourceView, ViewOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = ResourceRouterBuilder::new().with_env().build();
//!     let mut view = ResourceView::new(
//!         "transcripts",
//!         router,
//!         Arc::new(MemoryStore::new()),
//!         ViewOptions::default(),
//!     );
//!
//!     let items = view.sort("newest", &QueryParams::new()).await;
//!     println!("{} transcripts", items.len());
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │  ResourceView   │────▶│  ResourceCache   │──▶ KeyValueStore
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ ResourceRouter  │────▶│ Source priority  │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Fetcher         │────▶│ HttpClient       │
//! │ (timeout/retry) │     │ (reqwest)        │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Normalizer      │
//! └─────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod http_client;
pub mod normalize;
pub mod query;
pub mod resource;
pub mod retry;
pub mod routing;
pub mod sources;
pub mod stats;
pub mod store;
pub mod view;

pub use cache::{CacheEntry, CacheLookup, CacheMode, ResourceCache};
pub use config::{ApiConfig, FetchConfig, ModeSettings, RuntimeMode};
pub use error::{CoreError, StoreError, ValidationError};
pub use fetcher::{FetchError, Fetcher};
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpFuture, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use normalize::{validate_resource_data, NormalizedResponse, RawPayload};
pub use query::QueryParams;
pub use resource::{ResourceEndpoints, ResourceType};
pub use retry::Backoff;
pub use routing::{ResourceRouter, ResourceRouterBuilder, RouteError, RouteSuccess};
pub use sources::data_sources;
pub use stats::ResourceStats;
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreFuture};
pub use view::{ResourceView, ViewOptions, ViewState};
