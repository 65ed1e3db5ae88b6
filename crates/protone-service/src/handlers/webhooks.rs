//! Stripe webhook endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use protone_core::{UserId, UserRecord};
use protone_store::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// Incoming Stripe webhook event envelope.
#[derive(Debug, Deserialize)]
pub struct StripeWebhook {
    /// Event type (e.g. "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event id.
    pub id: String,

    /// Event payload.
    pub data: StripeEventData,
}

/// Event payload wrapper.
#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    /// The object the event describes.
    pub object: serde_json::Value,
}

/// Webhook acknowledgement.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the event was received.
    pub received: bool,
}

/// `POST /webhooks/stripe` - Stripe event sink.
///
/// Signature verification runs when a webhook secret is configured;
/// without one the event is processed as-is (dev mode). Unknown event
/// types are acknowledged and dropped so Stripe does not retry them.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    let signature = headers.get("stripe-signature").and_then(|v| v.to_str().ok());

    if state.config.stripe_webhook_secret.is_some() {
        if let Some(stripe) = &state.stripe {
            let sig = signature
                .ok_or_else(|| ApiError::BadRequest("Missing Stripe signature".to_string()))?;
            stripe.verify_webhook_signature(&body, sig).map_err(|e| {
                tracing::warn!(error = %e, "Webhook signature verification failed");
                ApiError::BadRequest("Invalid webhook signature".to_string())
            })?;
        } else {
            tracing::warn!(
                "Webhook secret set but Stripe client not configured - skipping verification"
            );
        }
    } else {
        tracing::warn!("STRIPE_WEBHOOK_SECRET not set - skipping signature verification");
    }

    let webhook: StripeWebhook =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        event_type = %webhook.event_type,
        event_id = %webhook.id,
        "Received Stripe webhook"
    );

    match webhook.event_type.as_str() {
        "checkout.session.completed" => {
            handle_checkout_completed(&state, &webhook.data.object).await?;
        }
        "customer.subscription.created" | "customer.subscription.updated" => {
            handle_subscription_updated(&state, &webhook.data.object).await?;
        }
        "customer.subscription.deleted" => {
            handle_subscription_deleted(&state, &webhook.data.object).await?;
        }
        _ => {
            tracing::debug!(event_type = %webhook.event_type, "Unhandled Stripe event");
        }
    }

    Ok(Json(WebhookResponse { received: true }))
}

/// A completed checkout flips the user to premium and stores the Stripe
/// linkage carried on the session.
async fn handle_checkout_completed(
    state: &AppState,
    data: &serde_json::Value,
) -> Result<(), ApiError> {
    let session_id = str_field(data, "id").unwrap_or("unknown");
    let customer_id = str_field(data, "customer");
    let subscription_id = str_field(data, "subscription");
    let user_hint = data
        .get("metadata")
        .and_then(|metadata| metadata.get("user_id"))
        .and_then(|v| v.as_str())
        .or_else(|| str_field(data, "client_reference_id"));

    let mut user = resolve_by_hint(state, user_hint)?;
    if user.is_none() {
        if let Some(customer_id) = customer_id {
            user = state.store.find_user_by_customer(customer_id)?;
        }
    }

    let mut user = match user {
        Some(user) => user,
        None => {
            tracing::warn!(session_id = %session_id, "No user resolved for completed checkout");
            return Ok(());
        }
    };

    user.premium = true;
    if let Some(customer_id) = customer_id {
        user.stripe_customer_id = Some(customer_id.to_string());
    }
    if let Some(subscription_id) = subscription_id {
        user.stripe_subscription_id = Some(subscription_id.to_string());
    }
    user.updated_at = Utc::now();
    state.store.update_user(&user)?;

    tracing::info!(
        user_id = %user.id,
        session_id = %session_id,
        "Subscription activated from checkout"
    );
    Ok(())
}

/// Subscription create/update events sync premium status and linkage.
///
/// Premium tracks the subscription status: `active` and `trialing`
/// count, anything else (`past_due`, `canceled`, `unpaid`, ...) does
/// not.
async fn handle_subscription_updated(
    state: &AppState,
    data: &serde_json::Value,
) -> Result<(), ApiError> {
    let subscription_id = str_field(data, "id");
    let customer_id = str_field(data, "customer");
    let status = str_field(data, "status").unwrap_or("unknown");

    let mut user = match resolve_subscription_user(state, subscription_id, customer_id)? {
        Some(user) => user,
        None => return Ok(()),
    };

    let price_id = data
        .get("items")
        .and_then(|items| items.get("data"))
        .and_then(|entries| entries.get(0))
        .and_then(|entry| entry.get("price"))
        .and_then(|price| price.get("id"))
        .and_then(|v| v.as_str());
    let period_end = data
        .get("current_period_end")
        .and_then(serde_json::Value::as_i64);

    user.premium = matches!(status, "active" | "trialing");
    if let Some(subscription_id) = subscription_id {
        user.stripe_subscription_id = Some(subscription_id.to_string());
    }
    if let Some(customer_id) = customer_id {
        user.stripe_customer_id = Some(customer_id.to_string());
    }
    user.stripe_price_id = price_id.map(str::to_string);
    user.stripe_current_period_end = period_end.and_then(|ts| DateTime::from_timestamp(ts, 0));
    user.updated_at = Utc::now();
    state.store.update_user(&user)?;

    tracing::info!(
        user_id = %user.id,
        status = %status,
        premium = user.premium,
        "Subscription state synced"
    );
    Ok(())
}

/// A deleted subscription drops the user back to the free tier. The
/// Stripe customer link is kept so the billing portal still works.
async fn handle_subscription_deleted(
    state: &AppState,
    data: &serde_json::Value,
) -> Result<(), ApiError> {
    let subscription_id = str_field(data, "id");
    let customer_id = str_field(data, "customer");

    let mut user = match resolve_subscription_user(state, subscription_id, customer_id)? {
        Some(user) => user,
        None => return Ok(()),
    };

    user.clear_subscription();
    state.store.update_user(&user)?;

    tracing::info!(user_id = %user.id, "Subscription canceled");
    Ok(())
}

/// Look a user up by the id Stripe echoed back, if any.
///
/// A malformed hint is logged and treated as a miss rather than an
/// error; the caller falls back to the customer index.
fn resolve_by_hint(state: &AppState, hint: Option<&str>) -> Result<Option<UserRecord>, ApiError> {
    match hint {
        Some(raw) => match raw.parse::<UserId>() {
            Ok(user_id) => Ok(state.store.get_user(&user_id)?),
            Err(_) => {
                tracing::warn!(hint = %raw, "Unparseable user id on Stripe event");
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

/// Resolve the user a subscription event belongs to: by subscription id
/// first, then by customer id. Misses are logged, not errored, so
/// Stripe does not keep retrying events we can never match.
fn resolve_subscription_user(
    state: &AppState,
    subscription_id: Option<&str>,
    customer_id: Option<&str>,
) -> Result<Option<UserRecord>, ApiError> {
    if let Some(subscription_id) = subscription_id {
        if let Some(user) = state.store.find_user_by_subscription(subscription_id)? {
            return Ok(Some(user));
        }
    }
    if let Some(customer_id) = customer_id {
        if let Some(user) = state.store.find_user_by_customer(customer_id)? {
            return Ok(Some(user));
        }
    }

    tracing::warn!(
        subscription_id = subscription_id.unwrap_or("unknown"),
        customer_id = customer_id.unwrap_or("unknown"),
        "No user resolved for subscription event"
    );
    Ok(None)
}

fn str_field<'a>(data: &'a serde_json::Value, field: &str) -> Option<&'a str> {
    data.get(field).and_then(|v| v.as_str())
}
