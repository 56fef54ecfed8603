//! # Chapel Web
//!
//! Serves the local API routes and static data files that the fetch layer
//! in `chapel-core` treats as its API and local sources.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /api/transcripts` | [`transcripts::list`] |
//! | `POST /api/transcripts` | [`transcripts::create`] |
//! | `GET /api/audio` | [`audio::list`] |
//! | `GET /data/*` | static files from the data directory |

pub mod audio;
pub mod error;
pub mod transcripts;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

pub use error::ApiError;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    data_dir: PathBuf,
    /// Serializes read-modify-write cycles on the data files.
    write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub(crate) fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    let static_files = ServeDir::new(state.data_dir());

    Router::new()
        .route(
            "/api/transcripts",
            get(transcripts::list).post(transcripts::create),
        )
        .route("/api/audio", get(audio::list))
        .nest_service("/data", static_files)
        .layer(cors)
        .with_state(state)
}

pub(crate) fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Today's UTC date as `YYYY-MM-DD`.
pub(crate) fn today() -> String {
    let date = OffsetDateTime::now_utc().date();
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
