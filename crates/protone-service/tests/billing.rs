//! Billing endpoint integration tests.
//!
//! These cover the guard paths that fire before any Stripe API call.
//! Full checkout flows need a live Stripe account and live in the
//! staging smoke suite instead.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

fn harness_with_stripe() -> TestHarness {
    TestHarness::with_config(|config| {
        config.stripe_api_key = Some("sk_test_x".into());
        config.stripe_price_id = Some("price_x".into());
    })
}

#[tokio::test]
async fn checkout_without_stripe_is_bad_gateway() {
    let harness = TestHarness::new();
    let user_id = harness.register_user("ada@example.com").await;

    let response = harness
        .server
        .post("/v1/checkout")
        .add_header("authorization", TestHarness::auth_header_for(&user_id))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "external_service_error");
}

#[tokio::test]
async fn checkout_for_premium_user_conflicts() {
    let harness = harness_with_stripe();
    let user_id = harness.register_user("ada@example.com").await;

    // Activate the subscription through the webhook path
    harness
        .server
        .post("/webhooks/stripe")
        .json(&json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_1",
                    "customer": "cus_1",
                    "subscription": "sub_1",
                    "metadata": { "user_id": user_id.to_string() }
                }
            }
        }))
        .await
        .assert_status_ok();

    // The premium check fires before any Stripe call
    let response = harness
        .server
        .post("/v1/checkout")
        .add_header("authorization", TestHarness::auth_header_for(&user_id))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "conflict");
}

#[tokio::test]
async fn checkout_requires_auth() {
    let harness = harness_with_stripe();

    let response = harness.server.post("/v1/checkout").await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn checkout_for_unknown_user_is_not_found() {
    let harness = harness_with_stripe();

    let response = harness
        .server
        .post("/v1/checkout")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn portal_without_customer_conflicts() {
    let harness = harness_with_stripe();
    let user_id = harness.register_user("ada@example.com").await;

    let response = harness
        .server
        .post("/v1/billing-portal")
        .add_header("authorization", TestHarness::auth_header_for(&user_id))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "conflict");
}

#[tokio::test]
async fn portal_requires_auth() {
    let harness = harness_with_stripe();

    let response = harness.server.post("/v1/billing-portal").await;

    response.assert_status_unauthorized();
}
