//! Response normalization.
//!
//! Backends answer in one of three shapes:
//!
//! | Shape | Example |
//! |-------|---------|
//! | bare array | `[{...}, {...}]` |
//! | keyed by resource | `{"transcripts": [...], "pagination": {...}}` |
//! | items envelope | `{"items": [...], "timestamp": "..."}` |
//!
//! [`RawPayload::classify`] picks the shape and [`validate_resource_data`]
//! turns it into a [`NormalizedResponse`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::warn;

use crate::ValidationError;

/// Canonical listing record handed to views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResponse {
    pub items: Vec<Value>,
    pub metadata: Map<String, Value>,
    pub filters: Map<String, Value>,
    pub timestamp: String,
}

/// Payload shape, resolved from an arbitrary JSON document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawPayload<'a> {
    /// The document is the item list.
    List(&'a Vec<Value>),
    /// Items live under the resource-type key.
    Keyed(&'a Value),
    /// Items live under `items`.
    Items(&'a Value),
    /// No item container was found.
    Empty,
}

impl<'a> RawPayload<'a> {
    pub fn classify(data: &'a Value, resource: &str) -> Self {
        match data {
            Value::Array(items) => Self::List(items),
            Value::Object(map) => {
                if let Some(value) = map.get(resource).filter(|v| is_truthy(v)) {
                    Self::Keyed(value)
                } else if let Some(value) = map.get("items").filter(|v| is_truthy(v)) {
                    Self::Items(value)
                } else {
                    Self::Empty
                }
            }
            _ => Self::Empty,
        }
    }

    fn items(self) -> Option<Vec<Value>> {
        match self {
            Self::List(items) => Some(items.clone()),
            Self::Keyed(value) | Self::Items(value) => value.as_array().cloned(),
            Self::Empty => Some(Vec::new()),
        }
    }
}

/// Normalize a backend payload for `resource`.
///
/// # Errors
///
/// - [`ValidationError::NoData`] when `data` is `null`
/// - [`ValidationError::InvalidFormat`] when the item container is not an array
///
/// An empty item list is not an error.
pub fn validate_resource_data(data: &Value, resource: &str) -> Result<NormalizedResponse, ValidationError> {
    if data.is_null() {
        return Err(ValidationError::NoData {
            resource: resource.to_owned(),
        });
    }

    let items = RawPayload::classify(data, resource)
        .items()
        .ok_or_else(|| ValidationError::InvalidFormat {
            resource: resource.to_owned(),
        })?;

    if items.is_empty() {
        warn!(resource, "no items found");
    }

    let metadata = first_object(data, &["pagination", "meta"]);
    let filters = first_object(data, &["filters"]);
    let timestamp = data
        .get("timestamp")
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(now_rfc3339);

    Ok(NormalizedResponse {
        items,
        metadata,
        filters,
        timestamp,
    })
}

/// Current UTC time in RFC 3339.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

fn first_object(data: &Value, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|key| data.get(*key))
        .find(|value| is_truthy(value))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
