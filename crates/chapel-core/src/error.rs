use thiserror::Error;

/// Payload and input validation errors exposed by `chapel-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no {resource} data received")]
    NoData { resource: String },

    #[error("invalid {resource} data format: expected array")]
    InvalidFormat { resource: String },

    #[error("unknown resource type '{value}', expected one of audio, transcripts, articles, gallery")]
    UnknownResourceType { value: String },

    #[error("invalid runtime mode '{value}', expected development or production")]
    InvalidRuntimeMode { value: String },
}

/// Errors raised by a [`KeyValueStore`](crate::store::KeyValueStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Route(#[from] crate::routing::RouteError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
