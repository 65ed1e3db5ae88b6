//! Checkout and billing portal endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use protone_core::UserRecord;
use protone_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::ratelimit;
use crate::state::AppState;
use crate::stripe::StripeClient;

/// Response carrying a hosted Stripe URL.
#[derive(Debug, Serialize)]
pub struct RedirectResponse {
    /// URL to send the user to.
    pub url: String,
}

/// `POST /v1/checkout` - start a premium subscription checkout.
pub async fn checkout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    headers: HeaderMap,
) -> Result<Json<RedirectResponse>, ApiError> {
    ratelimit::enforce(&state, &ratelimit::CHECKOUT_POLICY, &auth.user_id, &headers).await?;

    let mut user = state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if user.premium {
        return Err(ApiError::Conflict(
            "Subscription is already active".to_string(),
        ));
    }

    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Billing is not configured".to_string()))?;
    let price_id = state
        .config
        .stripe_price_id
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Billing is not configured".to_string()))?;

    let customer_id = ensure_customer(&state, stripe, &mut user).await?;

    let success_url = format!("{}/?checkout=success", state.config.app_url);
    let cancel_url = format!("{}/?checkout=canceled", state.config.app_url);

    let session = stripe
        .create_subscription_checkout(
            &customer_id,
            auth.user_id.as_str(),
            price_id,
            &success_url,
            &cancel_url,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %auth.user_id, "Failed to create checkout session");
            ApiError::ExternalService("Failed to start checkout".to_string())
        })?;

    let url = session
        .url
        .ok_or_else(|| ApiError::ExternalService("Checkout session has no URL".to_string()))?;

    tracing::info!(user_id = %auth.user_id, session_id = %session.id, "Checkout session created");

    Ok(Json(RedirectResponse { url }))
}

/// `POST /v1/billing-portal` - open the subscription management portal.
pub async fn billing_portal(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    headers: HeaderMap,
) -> Result<Json<RedirectResponse>, ApiError> {
    ratelimit::enforce(&state, &ratelimit::PORTAL_POLICY, &auth.user_id, &headers).await?;

    let user = state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let customer_id = user
        .stripe_customer_id
        .as_ref()
        .ok_or_else(|| ApiError::Conflict("No billing account yet".to_string()))?;

    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Billing is not configured".to_string()))?;

    let return_url = format!("{}/", state.config.app_url);
    let session = stripe
        .create_billing_portal_session(customer_id, &return_url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %auth.user_id, "Failed to create billing portal session");
            ApiError::ExternalService("Failed to open billing portal".to_string())
        })?;

    Ok(Json(RedirectResponse { url: session.url }))
}

/// Find or create the Stripe customer for a user, keeping the email and
/// user-id metadata current.
async fn ensure_customer(
    state: &AppState,
    stripe: &StripeClient,
    user: &mut UserRecord,
) -> Result<String, ApiError> {
    if let Some(customer_id) = &user.stripe_customer_id {
        // Refresh email/metadata on the existing customer; a failure here
        // is not worth failing checkout over.
        if let Err(e) = stripe
            .update_customer(customer_id, user.id.as_str(), &user.email)
            .await
        {
            tracing::warn!(error = %e, customer_id = %customer_id, "Failed to refresh Stripe customer");
        }
        return Ok(customer_id.clone());
    }

    let customer = stripe
        .create_customer(user.id.as_str(), &user.email)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %user.id, "Failed to create Stripe customer");
            ApiError::ExternalService("Failed to start checkout".to_string())
        })?;

    user.stripe_customer_id = Some(customer.id.clone());
    user.updated_at = Utc::now();
    state.store.update_user(user)?;

    tracing::info!(user_id = %user.id, customer_id = %customer.id, "Stripe customer created");

    Ok(customer.id)
}
