//! Resilient single-URL fetcher.
//!
//! Every attempt is bounded by [`FetchConfig::timeout`]; an attempt that
//! overruns is dropped, which aborts the in-flight request. Failed attempts
//! are retried after the configured backoff until [`FetchConfig::attempts`]
//! is exhausted, and then only the last error is reported.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::http_client::{HttpClient, HttpErrorKind, HttpRequest};

/// Failure of a single fetch attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("{0}")]
    Transport(String),

    #[error("HTTP {status}: {status_text}")]
    Status { status: u16, status_text: String },

    #[error("invalid JSON response: {0}")]
    Parse(String),
}

/// Fetches JSON documents with timeout and retry.
#[derive(Clone)]
pub struct Fetcher {
    client: Arc<dyn HttpClient>,
}

impl Fetcher {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    pub async fn fetch_with_retry(&self, url: &str, config: &FetchConfig) -> Result<Value, FetchError> {
        let attempts = config.attempts();
        let mut last_error = None;

        for attempt in 1..=attempts {
            debug!(attempt, attempts, url, "fetch attempt");

            match self.attempt(url, config).await {
                Ok(data) => {
                    debug!(attempt, url, "fetch succeeded");
                    return Ok(data);
                }
                Err(error) => {
                    warn!(attempt, url, %error, "fetch attempt failed");
                    last_error = Some(error);

                    if attempt < attempts {
                        let delay = config.backoff.delay(attempt - 1);
                        debug!(delay_ms = delay.as_millis() as u64, "retrying");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        // attempts() is at least one, so the loop always records an error before reaching here
        Err(last_error.unwrap_or_else(|| FetchError::Transport(format!("no attempt made for {url}"))))
    }

    async fn attempt(&self, url: &str, config: &FetchConfig) -> Result<Value, FetchError> {
        let request = HttpRequest::get(url)
            .with_headers(&config.headers)
            .with_timeout(config.timeout);
        let timeout_ms = config.timeout.as_millis().min(u128::from(u64::MAX)) as u64;

        let response = match tokio::time::timeout(config.timeout, self.client.execute(request)).await {
            Err(_elapsed) => {
                return Err(FetchError::Timeout {
                    url: url.to_owned(),
                    timeout_ms,
                })
            }
            Ok(Err(error)) if error.kind() == HttpErrorKind::Timeout => {
                return Err(FetchError::Timeout {
                    url: url.to_owned(),
                    timeout_ms,
                })
            }
            Ok(Err(error)) => return Err(FetchError::Transport(error.message().to_owned())),
            Ok(Ok(response)) => response,
        };

        if !response.is_success() {
            return Err(FetchError::Status {
                status: response.status,
                status_text: response.status_text,
            });
        }

        serde_json::from_str(&response.body).map_err(|e| FetchError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpError, HttpFuture, HttpResponse};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Scripted {
        replies: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<HttpResponse, HttpError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().expect("lock").len()
        }
    }

    impl HttpClient for Scripted {
        fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
            self.requests.lock().expect("lock").push(request);
            let reply = self
                .replies
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| Err(HttpError::connect("script exhausted")));
            Box::pin(async move { reply })
        }
    }

    struct Hanging;

    impl HttpClient for Hanging {
        fn execute<'a>(&'a self, _request: HttpRequest) -> HttpFuture<'a> {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(HttpResponse::ok_json("[]"))
            })
        }
    }

    fn quick() -> FetchConfig {
        FetchConfig::default().with_retry_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt() {
        let client = Scripted::new(vec![
            Err(HttpError::connect("refused")),
            Ok(HttpResponse::with_status(503, "Service Unavailable")),
            Ok(HttpResponse::ok_json(r#"[{"id":1}]"#)),
        ]);
        let fetcher = Fetcher::new(client.clone());

        let data = fetcher
            .fetch_with_retry("http://test/api/audio", &quick())
            .await
            .expect("third attempt succeeds");

        assert_eq!(data, serde_json::json!([{"id": 1}]));
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn last_error_wins_after_exhaustion() {
        let client = Scripted::new(vec![
            Err(HttpError::connect("refused")),
            Ok(HttpResponse::ok_json("not json")),
            Ok(HttpResponse::with_status(404, "Not Found")),
        ]);
        let fetcher = Fetcher::new(client.clone());

        let error = fetcher
            .fetch_with_retry("http://test/api/audio", &quick())
            .await
            .expect_err("all attempts fail");

        assert_eq!(
            error,
            FetchError::Status {
                status: 404,
                status_text: String::from("Not Found")
            }
        );
        assert_eq!(error.to_string(), "HTTP 404: Not Found");
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn default_headers_are_sent() {
        let client = Scripted::new(vec![Ok(HttpResponse::ok_json("{}"))]);
        let fetcher = Fetcher::new(client.clone());

        fetcher
            .fetch_with_retry("http://test/data/gallery.json", &quick())
            .await
            .expect("success");

        let requests = client.requests.lock().expect("lock");
        assert_eq!(
            requests[0].headers.get("cache-control").map(String::as_str),
            Some("no-cache")
        );
    }

    #[tokio::test]
    async fn slow_attempts_time_out() {
        let fetcher = Fetcher::new(Arc::new(Hanging));
        let config = quick()
            .with_timeout(Duration::from_millis(20))
            .with_retries(2);

        let error = fetcher
            .fetch_with_retry("http://test/api/audio", &config)
            .await
            .expect_err("times out");

        assert_eq!(
            error,
            FetchError::Timeout {
                url: String::from("http://test/api/audio"),
                timeout_ms: 20
            }
        );
    }

    #[tokio::test]
    async fn zero_retries_still_attempts_once() {
        let client = Scripted::new(vec![Ok(HttpResponse::ok_json("[]"))]);
        let fetcher = Fetcher::new(client.clone());

        fetcher
            .fetch_with_retry("http://test/api/audio", &quick().with_retries(0))
            .await
            .expect("single attempt succeeds");

        assert_eq!(client.calls(), 1);
    }
}
