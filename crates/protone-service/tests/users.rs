//! User registration and profile integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn register_creates_user() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/users")
        .json(&json!({ "email": "ada@example.com" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert!(!body["id"].as_str().unwrap().is_empty());
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["premium"], false);
    assert_eq!(body["billing_connected"], false);
}

#[tokio::test]
async fn register_normalizes_email() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/users")
        .json(&json!({ "email": "  Ada@Example.COM " }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["email"], "ada@example.com");
}

#[tokio::test]
async fn register_rejects_invalid_email() {
    let harness = TestHarness::new();

    for email in ["", "   ", "not-an-email", "@example.com", "ada@nodot"] {
        let response = harness
            .server
            .post("/v1/users")
            .json(&json!({ "email": email }))
            .await;

        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"]["code"], "bad_request");
    }
}

#[tokio::test]
async fn register_duplicate_email_conflicts() {
    let harness = TestHarness::new();

    harness.register_user("ada@example.com").await;

    // Same address again, different casing
    let response = harness
        .server
        .post("/v1/users")
        .json(&json!({ "email": "Ada@example.com" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "conflict");
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn me_returns_profile() {
    let harness = TestHarness::new();
    let user_id = harness.register_user("ada@example.com").await;

    let response = harness
        .server
        .get("/v1/users/me")
        .add_header("authorization", TestHarness::auth_header_for(&user_id))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], user_id.to_string());
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["premium"], false);
}

#[tokio::test]
async fn me_for_unknown_user_is_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/users/me")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn me_without_auth_fails() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/users/me").await;

    response.assert_status_unauthorized();
}

// ============================================================================
// Session Tokens
// ============================================================================

#[tokio::test]
async fn expired_token_is_rejected() {
    let harness = TestHarness::new();
    let user_id = harness.register_user("ada@example.com").await;

    // Well past the default validation leeway
    let expired = common::mint_session_token_with_exp(&user_id, chrono::Utc::now().timestamp() - 3600);

    let response = harness
        .server
        .get("/v1/users/me")
        .add_header("authorization", format!("Bearer {expired}"))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/users/me")
        .add_header("authorization", "Bearer not-a-jwt")
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn token_signed_with_wrong_secret_is_rejected() {
    let harness = TestHarness::new();
    let user_id = harness.register_user("ada@example.com").await;

    let claims = protone_service::auth::SessionClaims {
        sub: user_id.to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
        iat: chrono::Utc::now().timestamp(),
    };
    let forged = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"some-other-secret"),
    )
    .unwrap();

    let response = harness
        .server
        .get("/v1/users/me")
        .add_header("authorization", format!("Bearer {forged}"))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn non_bearer_auth_is_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/users/me")
        .add_header("authorization", "Basic dXNlcjpwYXNz")
        .await;

    response.assert_status_unauthorized();
}
