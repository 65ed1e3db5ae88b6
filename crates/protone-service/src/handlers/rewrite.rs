//! Message rewrite endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use protone_core::{
    Mode, PeriodKey, Tone, UsageReservation, DEFAULT_RECIPIENT, MAX_INPUT_CHARS,
    MAX_RECIPIENT_CHARS,
};
use protone_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::ratelimit;
use crate::state::AppState;

/// Request to rewrite a message.
#[derive(Debug, Deserialize)]
pub struct RewriteRequest {
    /// The message to rewrite.
    pub text: String,

    /// Rewrite mode ("normal" or "fun").
    pub mode: String,

    /// Tone within the mode.
    pub tone: String,

    /// Who the message is for (optional).
    #[serde(default)]
    pub recipient: Option<String>,
}

/// Result of a rewrite.
#[derive(Debug, Serialize)]
pub struct RewriteResponse {
    /// The rewritten message.
    pub result: String,

    /// Whether the caller is on the premium plan.
    pub premium: bool,

    /// Rewrites consumed this week. Always 0 for premium users.
    pub used: u64,

    /// Weekly allowance; `null` for premium users.
    pub limit: Option<u64>,

    /// Rewrites left this week; `null` for premium users.
    pub remaining: Option<u64>,
}

/// A validated rewrite request.
struct ValidRewrite {
    text: String,
    mode: Mode,
    tone: Tone,
    recipient: String,
}

/// `POST /v1/rewrite` - rewrite a message, charging one weekly credit
/// for free-tier callers.
///
/// The credit is reserved before the backend call and rolled back if the
/// backend fails, so a failed rewrite is never charged.
pub async fn rewrite(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    headers: HeaderMap,
    Json(body): Json<RewriteRequest>,
) -> Result<Json<RewriteResponse>, ApiError> {
    let request = validate(&body)?;

    ratelimit::enforce(&state, &ratelimit::REWRITE_POLICY, &auth.user_id, &headers).await?;

    let user = state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let rewriter = state
        .rewriter
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Rewrite backend not configured".to_string()))?;

    // Reserve a weekly credit before spending backend tokens.
    let reservation = if user.is_metered() {
        let period = PeriodKey::for_week_of(Utc::now());
        let limit = state.config.weekly_free_limit;
        let reservation = state.store.reserve_usage(&auth.user_id, &period, limit)?;
        if !reservation.granted {
            return Err(ApiError::QuotaExhausted {
                used: reservation.used,
                limit: u64::from(limit),
            });
        }
        Some(reservation)
    } else {
        None
    };

    let result = match rewriter
        .rewrite(&request.text, request.mode, request.tone, &request.recipient)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            // The rewrite was never delivered, so hand the credit back.
            if let Some(reservation) = &reservation {
                rollback(&state, &auth, reservation);
            }
            tracing::error!(error = %e, user_id = %auth.user_id, "Rewrite backend call failed");
            return Err(ApiError::ExternalService("Rewrite failed".to_string()));
        }
    };

    tracing::info!(
        user_id = %auth.user_id,
        mode = %request.mode,
        tone = %request.tone,
        "Rewrite completed"
    );

    let response = match reservation {
        Some(reservation) => RewriteResponse {
            result,
            premium: false,
            used: reservation.used,
            limit: Some(u64::from(state.config.weekly_free_limit)),
            remaining: Some(reservation.remaining),
        },
        None => RewriteResponse {
            result,
            premium: true,
            used: 0,
            limit: None,
            remaining: None,
        },
    };

    Ok(Json(response))
}

/// Check and normalize a rewrite request.
fn validate(body: &RewriteRequest) -> Result<ValidRewrite, ApiError> {
    let text = body.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("text is required".to_string()));
    }
    if text.chars().count() > MAX_INPUT_CHARS {
        return Err(ApiError::BadRequest(format!(
            "text is limited to {MAX_INPUT_CHARS} characters"
        )));
    }

    let mode = body
        .mode
        .parse::<Mode>()
        .map_err(|_| ApiError::BadRequest(format!("unknown mode: {}", body.mode)))?;
    let tone = body
        .tone
        .parse::<Tone>()
        .map_err(|_| ApiError::BadRequest(format!("unknown tone: {}", body.tone)))?;
    if !mode.allows(tone) {
        return Err(ApiError::BadRequest(format!(
            "tone {tone} is not available in {mode} mode"
        )));
    }

    let recipient = match &body.recipient {
        Some(recipient) => {
            let trimmed = recipient.trim();
            if trimmed.chars().count() > MAX_RECIPIENT_CHARS {
                return Err(ApiError::BadRequest(format!(
                    "recipient is limited to {MAX_RECIPIENT_CHARS} characters"
                )));
            }
            if trimmed.is_empty() {
                DEFAULT_RECIPIENT.to_string()
            } else {
                trimmed.to_string()
            }
        }
        None => DEFAULT_RECIPIENT.to_string(),
    };

    Ok(ValidRewrite {
        text: text.to_string(),
        mode,
        tone,
        recipient,
    })
}

/// Return a reserved credit after a failed backend call.
///
/// Best-effort: a failure here costs the caller one credit, so it is
/// logged and swallowed rather than surfaced on top of the backend
/// error.
fn rollback(state: &AppState, auth: &AuthUser, reservation: &UsageReservation) {
    if let Err(e) = state
        .store
        .rollback_usage(&auth.user_id, &reservation.period_key)
    {
        tracing::warn!(
            error = %e,
            user_id = %auth.user_id,
            period = %reservation.period_key,
            "Failed to roll back usage reservation"
        );
    }
}
