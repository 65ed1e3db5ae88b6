//! User registration and profile endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use protone_core::{UserId, UserRecord};
use protone_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Longest accepted email address.
const MAX_EMAIL_CHARS: usize = 254;

/// Request to register a new user.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Sign-in email address.
    pub email: String,
}

/// A user profile as returned by the API.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User id.
    pub id: String,
    /// Sign-in email address.
    pub email: String,
    /// Whether the user holds an active subscription.
    pub premium: bool,
    /// Whether a billing account is linked.
    pub billing_connected: bool,
    /// When the user registered (RFC 3339).
    pub created_at: String,
}

impl From<&UserRecord> for UserResponse {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            premium: user.premium,
            billing_connected: user.stripe_customer_id.is_some(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// `POST /v1/users` - register a new user.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let email = normalize_email(&body.email)?;

    let user = UserRecord::new(UserId::generate(), email);
    state.store.create_user(&user)?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// `GET /v1/users/me` - fetch the caller's profile.
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(&user)))
}

/// Trim, lowercase, and sanity-check an email address.
fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_ascii_lowercase();
    if email.is_empty() {
        return Err(ApiError::BadRequest("email is required".to_string()));
    }
    if email.len() > MAX_EMAIL_CHARS {
        return Err(ApiError::BadRequest("email is too long".to_string()));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(ApiError::BadRequest("email is invalid".to_string()));
    }

    Ok(email)
}
