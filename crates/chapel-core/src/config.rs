//! Runtime configuration for the fetch layer.
//!
//! All environment lookups happen once, in [`ApiConfig::from_env`]. The
//! resulting value is passed by reference into the router and views.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use crate::retry::Backoff;
use crate::ValidationError;

pub const DEFAULT_DEV_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_PROD_API_URL: &str = "https://egfmusa.org";
pub const DEFAULT_CDN_URL: &str = "https://egfmusa.b-cdn.net";

/// Deployment mode; drives source priority and cache lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    #[default]
    Development,
    Production,
}

impl RuntimeMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    pub const fn settings(self) -> ModeSettings {
        match self {
            Self::Development => ModeSettings {
                enable_logging: true,
                enable_fallbacks: true,
                cache_timeout: Duration::ZERO,
            },
            Self::Production => ModeSettings {
                enable_logging: false,
                enable_fallbacks: true,
                cache_timeout: Duration::from_secs(300),
            },
        }
    }
}

impl Display for RuntimeMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuntimeMode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ValidationError::InvalidRuntimeMode {
                value: other.to_owned(),
            }),
        }
    }
}

/// Per-mode behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSettings {
    /// Verbose diagnostics are wanted (binaries pick their default filter from this).
    pub enable_logging: bool,
    /// Views substitute caller-supplied fallback items on failure.
    pub enable_fallbacks: bool,
    /// Age after which a cache entry is stale. Zero disables caching.
    pub cache_timeout: Duration,
}

/// Base URLs and mode, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub mode: RuntimeMode,
    pub dev_api_url: String,
    pub prod_api_url: String,
    pub cdn_url: String,
    /// Origin the caller is served from; takes precedence over the mode URLs.
    pub origin: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            mode: RuntimeMode::Development,
            dev_api_url: String::from(DEFAULT_DEV_API_URL),
            prod_api_url: String::from(DEFAULT_PROD_API_URL),
            cdn_url: String::from(DEFAULT_CDN_URL),
            origin: None,
        }
    }
}

impl ApiConfig {
    /// Environment Variables
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `NODE_ENV` | `development` |
    /// | `NEXT_PUBLIC_DEV_API_URL` | `http://localhost:3000` |
    /// | `NEXT_PUBLIC_PROD_API_URL` | `https://egfmusa.org` |
    /// | `NEXT_PUBLIC_CDN_URL` | `https://egfmusa.b-cdn.net` |
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Unrecognized modes fall back
    /// to development.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Self {
            mode: non_empty("NODE_ENV")
                .and_then(|value| value.parse().ok())
                .unwrap_or_default(),
            dev_api_url: non_empty("NEXT_PUBLIC_DEV_API_URL").unwrap_or(defaults.dev_api_url),
            prod_api_url: non_empty("NEXT_PUBLIC_PROD_API_URL").unwrap_or(defaults.prod_api_url),
            cdn_url: non_empty("NEXT_PUBLIC_CDN_URL").unwrap_or(defaults.cdn_url),
            origin: None,
        }
    }

    pub fn with_mode(mut self, mode: RuntimeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_cdn_url(mut self, cdn_url: impl Into<String>) -> Self {
        self.cdn_url = cdn_url.into();
        self
    }

    /// Site base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        let base = match (&self.origin, self.mode) {
            (Some(origin), _) => origin.as_str(),
            (None, RuntimeMode::Production) => self.prod_api_url.as_str(),
            (None, RuntimeMode::Development) => self.dev_api_url.as_str(),
        };
        base.trim_end_matches('/')
    }

    pub fn cdn_base(&self) -> &str {
        self.cdn_url.trim_end_matches('/')
    }

    pub const fn settings(&self) -> ModeSettings {
        self.mode.settings()
    }
}

/// Per-request transport settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Upper bound for a single attempt.
    pub timeout: Duration,
    /// Total number of attempts per source.
    pub retries: u32,
    pub backoff: Backoff,
    pub headers: BTreeMap<String, String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(String::from("content-type"), String::from("application/json"));
        headers.insert(String::from("cache-control"), String::from("no-cache"));

        Self {
            timeout: Duration::from_millis(10_000),
            retries: 3,
            backoff: Backoff::default(),
            headers,
        }
    }
}

impl FetchConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.backoff = Backoff::Fixed { delay };
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Adds or replaces a header. Names are case-insensitive.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Copy with per-call headers layered over the defaults; later values win.
    pub fn merged_headers<'a, I>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        overrides
            .into_iter()
            .fold(self.clone(), |config, (name, value)| config.with_header(name, value))
    }

    /// Attempts actually performed; zero is treated as one.
    pub fn attempts(&self) -> u32 {
        self.retries.max(1)
    }
}
