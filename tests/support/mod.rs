//! Scripted transport shared by the behavior tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chapel_core::{
    ApiConfig, FetchConfig, HttpClient, HttpError, HttpFuture, HttpRequest, HttpResponse,
    ResourceRouter, ResourceRouterBuilder,
};

pub type Reply = Result<HttpResponse, HttpError>;

/// Replies per URL (query string ignored). Each URL pops its own queue;
/// once a queue runs dry its last reply repeats. Unknown URLs are refused.
#[derive(Default)]
pub struct ScriptedHttpClient {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    last: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(self: &Arc<Self>, url: &str, replies: Vec<Reply>) -> Arc<Self> {
        self.replies
            .lock()
            .expect("lock")
            .insert(url.to_owned(), replies.into());
        Arc::clone(self)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("lock").clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().expect("lock").len()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.requests
            .lock()
            .expect("lock")
            .iter()
            .filter(|request| strip_query(&request.url) == url)
            .count()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        let url = strip_query(&request.url).to_owned();
        self.requests.lock().expect("lock").push(request);

        let next = self
            .replies
            .lock()
            .expect("lock")
            .get_mut(&url)
            .and_then(VecDeque::pop_front);
        let reply = match next {
            Some(reply) => {
                self.last
                    .lock()
                    .expect("lock")
                    .insert(url.clone(), reply.clone());
                reply
            }
            None => self
                .last
                .lock()
                .expect("lock")
                .get(&url)
                .cloned()
                .unwrap_or_else(|| Err(HttpError::connect(format!("connection refused: {url}")))),
        };

        Box::pin(async move { reply })
    }
}

fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

pub fn ok(body: &str) -> Reply {
    Ok(HttpResponse::ok_json(body))
}

pub fn status(code: u16, text: &str) -> Reply {
    Ok(HttpResponse::with_status(code, text))
}

pub fn refused() -> Reply {
    Err(HttpError::connect("connection refused"))
}

pub fn fast_fetch_config() -> FetchConfig {
    FetchConfig::default().with_retry_delay(Duration::from_millis(1))
}

pub fn router(config: ApiConfig, client: Arc<ScriptedHttpClient>) -> ResourceRouter {
    ResourceRouterBuilder::new()
        .with_config(config)
        .with_fetch_config(fast_fetch_config())
        .with_http_client(client)
        .build()
}

pub const DEV_API_AUDIO: &str = "http://localhost:3000/api/audio";
pub const DEV_LOCAL_AUDIO: &str = "http://localhost:3000/data/audios.json";
pub const CDN_AUDIO: &str = "https://egfmusa.b-cdn.net/audios/audios.json";
pub const CDN_TRANSCRIPTS: &str = "https://egfmusa.b-cdn.net/transcripts/transcripts.json";
pub const PROD_API_TRANSCRIPTS: &str = "https://egfmusa.org/api/transcripts";
pub const PROD_LOCAL_TRANSCRIPTS: &str = "https://egfmusa.org/data/transcripts.json";
