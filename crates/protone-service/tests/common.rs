//! Common test utilities for protone integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;

use protone_core::UserId;
use protone_service::auth::SessionClaims;
use protone_service::{create_router, AppState, ServiceConfig};
use protone_store::RocksStore;

/// Session secret shared by the harness and minted test tokens.
pub const SESSION_SECRET: &str = "test-session-secret";

/// Weekly free limit configured in tests; small so exhaustion tests
/// stay short.
pub const TEST_WEEKLY_LIMIT: u32 = 3;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A user ID with no registered record, for missing-user tests.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a harness after tweaking the default test configuration.
    pub fn with_config(tweak: impl FnOnce(&mut ServiceConfig)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open store");

        let mut config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            session_secret: Some(SESSION_SECRET.to_string()),
            weekly_free_limit: TEST_WEEKLY_LIMIT,
            app_url: "http://localhost:3000".into(),
            openai_api_key: None,
            openai_base_url: "http://localhost:9".into(),
            openai_model: "gpt-4o-mini".into(),
            stripe_api_key: None,
            stripe_webhook_secret: None,
            stripe_price_id: None,
            rate_limit_url: None,
            rate_limit_token: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        };
        tweak(&mut config);

        let state = AppState::new(Arc::new(store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            _temp_dir: temp_dir,
            test_user_id,
        }
    }

    /// Register a user through the API and return their id.
    pub async fn register_user(&self, email: &str) -> UserId {
        let response = self
            .server
            .post("/v1/users")
            .json(&serde_json::json!({ "email": email }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: serde_json::Value = response.json();
        body["id"]
            .as_str()
            .expect("registration response carries an id")
            .parse()
            .expect("registered id parses as a user id")
    }

    /// Authorization header for the harness's unregistered test user.
    pub fn user_auth_header(&self) -> String {
        Self::auth_header_for(&self.test_user_id)
    }

    /// Authorization header for an arbitrary user id.
    pub fn auth_header_for(user_id: &UserId) -> String {
        format!("Bearer {}", mint_session_token(user_id))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Mint a valid session JWT for `user_id`.
pub fn mint_session_token(user_id: &UserId) -> String {
    mint_session_token_with_exp(user_id, chrono::Utc::now().timestamp() + 3600)
}

/// Mint a session JWT for `user_id` expiring at `exp` (unix seconds).
pub fn mint_session_token_with_exp(user_id: &UserId, exp: i64) -> String {
    let claims = SessionClaims {
        sub: user_id.to_string(),
        exp,
        iat: chrono::Utc::now().timestamp(),
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(SESSION_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// Build a `Stripe-Signature` header value the way Stripe signs payloads.
pub fn stripe_signature(secret: &str, payload: &str, timestamp: i64) -> String {
    let signed = format!("{timestamp}.{payload}");
    let mac = protone_service::crypto::hmac_sha256_hex(secret, &signed);
    format!("t={timestamp},v1={mac}")
}
