use std::fmt::{Display, Formatter};

use chapel_core::RuntimeMode;
use serde::Serialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

/// Request identifier (UUID v4) attached to every output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub request_id: RequestId,
    pub command: &'static str,
    pub mode: &'static str,
    pub generated_at: String,
    pub latency_ms: u64,
    pub warnings: Vec<String>,
}

impl Metadata {
    pub fn new(command: &'static str, mode: RuntimeMode, latency_ms: u64) -> Self {
        Self {
            request_id: RequestId::new_v4(),
            command,
            mode: mode.as_str(),
            generated_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            latency_ms,
            warnings: Vec::new(),
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// One JSON document per invocation.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub meta: Metadata,
    pub data: Value,
    pub errors: Vec<String>,
}
