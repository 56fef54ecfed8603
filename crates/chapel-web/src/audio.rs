use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::{now_rfc3339, AppState};

const FILE: &str = "audios.json";

/// `GET /api/audio`: the local audio listing wrapped with its origin.
pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let contents = tokio::fs::read_to_string(state.data_file(FILE))
        .await
        .map_err(|error| ApiError::AudioUnavailable(error.to_string()))?;
    let items: Value = serde_json::from_str(&contents)
        .map_err(|error| ApiError::AudioUnavailable(error.to_string()))?;

    Ok(Json(json!({
        "items": items,
        "timestamp": now_rfc3339(),
        "source": "local",
    })))
}
