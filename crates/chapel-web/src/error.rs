use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::now_rfc3339;

/// Route failures, each rendered as a JSON body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{resource} data file not found")]
    DataFileMissing { resource: &'static str, file: &'static str },

    #[error("missing required fields")]
    MissingFields { required: &'static [&'static str] },

    #[error("failed to fetch {resource}: {message}")]
    ReadFailed { resource: &'static str, message: String },

    #[error("failed to create {resource}: {message}")]
    WriteFailed { resource: &'static str, message: String },

    #[error("failed to load audio data: {0}")]
    AudioUnavailable(String),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::DataFileMissing { .. } => StatusCode::NOT_FOUND,
            Self::MissingFields { .. } => StatusCode::BAD_REQUEST,
            Self::ReadFailed { .. } | Self::WriteFailed { .. } | Self::AudioUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::DataFileMissing { resource, file } => json!({
                "error": format!("{} data file not found", capitalize(resource)),
                "message": format!("Please ensure {file} exists in the data directory"),
            }),
            Self::MissingFields { required } => json!({
                "error": "Missing required fields",
                "required": required,
            }),
            Self::ReadFailed { resource, message } => json!({
                "error": format!("Failed to fetch {resource}"),
                "message": message,
                "timestamp": now_rfc3339(),
            }),
            Self::WriteFailed { resource, message } => json!({
                "error": format!("Failed to create {resource}"),
                "message": message,
            }),
            Self::AudioUnavailable(message) => json!({
                "message": "Failed to load audio data",
                "error": message,
            }),
        };

        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(body)).into_response()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
