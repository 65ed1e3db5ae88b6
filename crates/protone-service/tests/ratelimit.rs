//! Rate limiting integration tests.
//!
//! The limiter service is a wiremock server; these tests pin down the
//! check protocol, the denial envelope, and fail-open behavior.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn harness_with_limiter(limiter: &MockServer) -> TestHarness {
    let uri = limiter.uri();
    TestHarness::with_config(move |config| {
        config.rate_limit_url = Some(uri);
        config.rate_limit_token = Some("limiter-token".into());
    })
}

fn rewrite_request() -> serde_json::Value {
    json!({ "text": "hello", "mode": "normal", "tone": "casual" })
}

#[tokio::test]
async fn blocked_request_gets_retry_after() {
    let limiter = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "allowed": false,
            "retry_after_seconds": 17
        })))
        .mount(&limiter)
        .await;

    let harness = harness_with_limiter(&limiter);
    let user_id = harness.register_user("ada@example.com").await;

    let response = harness
        .server
        .post("/v1/rewrite")
        .add_header("authorization", TestHarness::auth_header_for(&user_id))
        .json(&rewrite_request())
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.header("retry-after"), "17");
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "rate_limited");
    assert_eq!(body["error"]["details"]["retry_after_seconds"], 17);
}

#[tokio::test]
async fn denial_without_hint_uses_window_length() {
    let limiter = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "allowed": false })))
        .mount(&limiter)
        .await;

    let harness = harness_with_limiter(&limiter);
    let user_id = harness.register_user("ada@example.com").await;

    let response = harness
        .server
        .post("/v1/rewrite")
        .add_header("authorization", TestHarness::auth_header_for(&user_id))
        .json(&rewrite_request())
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    // The rewrite per-user window is 60 seconds
    assert_eq!(response.header("retry-after"), "60");
}

#[tokio::test]
async fn limiter_outage_fails_open() {
    let limiter = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/check"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&limiter)
        .await;

    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "still here" },
                "finish_reason": "stop"
            }]
        })))
        .mount(&backend)
        .await;

    let limiter_uri = limiter.uri();
    let backend_uri = backend.uri();
    let harness = TestHarness::with_config(move |config| {
        config.rate_limit_url = Some(limiter_uri);
        config.openai_api_key = Some("backend-test-key".into());
        config.openai_base_url = backend_uri;
    });
    let user_id = harness.register_user("ada@example.com").await;

    let response = harness
        .server
        .post("/v1/rewrite")
        .add_header("authorization", TestHarness::auth_header_for(&user_id))
        .json(&rewrite_request())
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn rewrite_checks_user_and_ip_windows() {
    let limiter = MockServer::start().await;
    let backend = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "ok" },
                "finish_reason": "stop"
            }]
        })))
        .mount(&backend)
        .await;

    let limiter_uri = limiter.uri();
    let backend_uri = backend.uri();
    let harness = TestHarness::with_config(move |config| {
        config.rate_limit_url = Some(limiter_uri);
        config.rate_limit_token = Some("limiter-token".into());
        config.openai_api_key = Some("backend-test-key".into());
        config.openai_base_url = backend_uri;
    });
    let user_id = harness.register_user("ada@example.com").await;

    // One check per window, both carrying the bearer token. The test
    // client sends no forwarding headers, so the IP falls back.
    Mock::given(method("POST"))
        .and(path("/check"))
        .and(header("authorization", "Bearer limiter-token"))
        .and(body_partial_json(json!({
            "key": format!("rewrite:user:{user_id}"),
            "limit": 5,
            "window_seconds": 60
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "allowed": true })))
        .expect(1)
        .mount(&limiter)
        .await;
    Mock::given(method("POST"))
        .and(path("/check"))
        .and(header("authorization", "Bearer limiter-token"))
        .and(body_partial_json(json!({
            "key": "rewrite:ip:unknown",
            "limit": 10,
            "window_seconds": 60
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "allowed": true })))
        .expect(1)
        .mount(&limiter)
        .await;

    let response = harness
        .server
        .post("/v1/rewrite")
        .add_header("authorization", TestHarness::auth_header_for(&user_id))
        .json(&rewrite_request())
        .await;

    response.assert_status_ok();
    // Dropping the mock server verifies both expectations
}

#[tokio::test]
async fn checkout_is_rate_limited_before_billing_checks() {
    let limiter = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/check"))
        .and(body_partial_json(json!({ "limit": 3, "window_seconds": 600 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "allowed": false,
            "retry_after_seconds": 120
        })))
        .mount(&limiter)
        .await;

    // Stripe is deliberately unconfigured; the limiter must answer first
    let harness = harness_with_limiter(&limiter);
    let user_id = harness.register_user("ada@example.com").await;

    let response = harness
        .server
        .post("/v1/checkout")
        .add_header("authorization", TestHarness::auth_header_for(&user_id))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "rate_limited");
}
