//! Behavior tests for the fetch layer: prioritization, retry, fallback,
//! and normalization working together.

mod support;

use chapel_core::{
    data_sources, validate_resource_data, ApiConfig, FetchError, Fetcher, QueryParams,
    RouteError, RuntimeMode, ValidationError,
};
use serde_json::json;
use support::*;

// =============================================================================
// Fallback chain
// =============================================================================

#[tokio::test]
async fn when_first_source_answers_later_sources_are_never_called() {
    // Given: three reachable sources in development order
    let client = ScriptedHttpClient::new()
        .reply(DEV_API_AUDIO, vec![ok(r#"{"items":[{"id":1}]}"#)])
        .reply(DEV_LOCAL_AUDIO, vec![ok("[]")])
        .reply(CDN_AUDIO, vec![ok("[]")]);
    let router = router(ApiConfig::default(), client.clone());

    // When: audio is fetched
    let route = router
        .fetch_resource_data("audio", &QueryParams::new())
        .await
        .expect("first source succeeds");

    // Then: only the first source was contacted
    assert_eq!(route.data, json!({"items": [{"id": 1}]}));
    assert_eq!(route.selected_source, DEV_API_AUDIO);
    assert_eq!(client.calls_to(DEV_API_AUDIO), 1);
    assert_eq!(client.calls_to(DEV_LOCAL_AUDIO), 0);
    assert_eq!(client.calls_to(CDN_AUDIO), 0);
    assert!(route.warnings.is_empty());
}

#[tokio::test]
async fn when_cdn_fails_in_production_the_api_route_is_used() {
    let client = ScriptedHttpClient::new()
        .reply(CDN_TRANSCRIPTS, vec![status(502, "Bad Gateway")])
        .reply(PROD_API_TRANSCRIPTS, vec![ok(r#"{"transcripts":[{"id":"t1"}]}"#)]);
    let config = ApiConfig::default().with_mode(RuntimeMode::Production);

    let route = router(config, client.clone())
        .fetch_resource_data("transcripts", &QueryParams::new())
        .await
        .expect("api route succeeds");

    assert_eq!(route.selected_source, PROD_API_TRANSCRIPTS);
    assert_eq!(route.source_chain, vec![CDN_TRANSCRIPTS, PROD_API_TRANSCRIPTS]);
    // the CDN exhausted its retries before the chain moved on
    assert_eq!(client.calls_to(CDN_TRANSCRIPTS), 3);
    assert_eq!(client.calls_to(PROD_LOCAL_TRANSCRIPTS), 0);
}

#[tokio::test]
async fn when_all_sources_fail_the_last_failure_is_reported() {
    let client = ScriptedHttpClient::new()
        .reply(CDN_TRANSCRIPTS, vec![refused()])
        .reply(PROD_API_TRANSCRIPTS, vec![status(500, "Internal Server Error")])
        .reply(PROD_LOCAL_TRANSCRIPTS, vec![status(404, "Not Found")]);
    let config = ApiConfig::default().with_mode(RuntimeMode::Production);

    let error = router(config, client.clone())
        .fetch_resource_data("transcripts", &QueryParams::new())
        .await
        .expect_err("every source fails");

    assert_eq!(
        error.to_string(),
        "failed to fetch transcripts from all sources: HTTP 404: Not Found"
    );
    match error {
        RouteError::Exhausted { last, source_chain, .. } => {
            assert_eq!(
                last,
                FetchError::Status {
                    status: 404,
                    status_text: String::from("Not Found")
                }
            );
            assert_eq!(source_chain.len(), 3);
        }
        other => panic!("expected exhausted chain, got {other:?}"),
    }
    assert_eq!(client.calls(), 9);
}

#[tokio::test]
async fn unknown_resource_fails_without_any_http_call() {
    let client = ScriptedHttpClient::new();

    assert!(data_sources("unknown", &ApiConfig::default()).is_empty());

    let error = router(ApiConfig::default(), client.clone())
        .fetch_resource_data("unknown", &QueryParams::new())
        .await
        .expect_err("no sources");

    assert_eq!(
        error,
        RouteError::NoSources {
            resource: String::from("unknown")
        }
    );
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn query_parameters_reach_every_attempted_source() {
    let client = ScriptedHttpClient::new().reply(CDN_AUDIO, vec![ok("[]")]);
    let params = QueryParams::new()
        .with("category", "Sunday Service")
        .with("page", 2);

    router(ApiConfig::default(), client.clone())
        .fetch_resource_data("audio", &params)
        .await
        .expect("cdn succeeds");

    let requests = client.requests();
    assert_eq!(requests.len(), 7);
    for request in requests {
        assert!(
            request.url.ends_with("?category=Sunday%20Service&page=2"),
            "unexpected url {}",
            request.url
        );
    }
}

// =============================================================================
// Resilient fetcher
// =============================================================================

#[tokio::test]
async fn fetcher_succeeds_on_third_attempt_with_exactly_three_calls() {
    let client = ScriptedHttpClient::new().reply(
        DEV_API_AUDIO,
        vec![refused(), status(503, "Service Unavailable"), ok(r#"[{"id":7}]"#)],
    );
    let fetcher = Fetcher::new(client.clone());

    let data = fetcher
        .fetch_with_retry(DEV_API_AUDIO, &fast_fetch_config())
        .await
        .expect("third attempt succeeds");

    assert_eq!(data, json!([{"id": 7}]));
    assert_eq!(client.calls(), 3);
}

#[tokio::test]
async fn fetcher_gives_up_after_configured_attempts() {
    let client = ScriptedHttpClient::new().reply(DEV_API_AUDIO, vec![refused()]);
    let fetcher = Fetcher::new(client.clone());

    let error = fetcher
        .fetch_with_retry(DEV_API_AUDIO, &fast_fetch_config().with_retries(5))
        .await
        .expect_err("always fails");

    assert_eq!(error, FetchError::Transport(String::from("connection refused")));
    assert_eq!(client.calls(), 5);
}

#[tokio::test]
async fn malformed_json_counts_as_a_failed_attempt() {
    let client = ScriptedHttpClient::new().reply(DEV_API_AUDIO, vec![ok("<html>")]);
    let fetcher = Fetcher::new(client.clone());

    let error = fetcher
        .fetch_with_retry(DEV_API_AUDIO, &fast_fetch_config())
        .await
        .expect_err("never parses");

    assert!(matches!(error, FetchError::Parse(_)));
    assert_eq!(client.calls(), 3);
}

// =============================================================================
// Normalization
// =============================================================================

#[test]
fn null_payload_is_reported_as_missing_data() {
    let error = validate_resource_data(&serde_json::Value::Null, "audio").expect_err("no data");
    assert_eq!(
        error,
        ValidationError::NoData {
            resource: String::from("audio")
        }
    );
}

#[test]
fn routed_payload_shapes_normalize_identically() {
    let keyed = validate_resource_data(&json!({"audio": [{"id": 1}]}), "audio").expect("keyed");
    let items = validate_resource_data(&json!({"items": [{"id": 1}]}), "audio").expect("items");
    let bare = validate_resource_data(&json!([{"id": 1}]), "audio").expect("bare");

    assert_eq!(keyed.items.len(), 1);
    assert_eq!(keyed.items, items.items);
    assert_eq!(items.items, bare.items);
}
