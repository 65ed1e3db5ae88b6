//! Weekly usage endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use protone_core::PeriodKey;
use protone_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Weekly usage summary for the caller.
#[derive(Debug, Serialize)]
pub struct UsageResponse {
    /// Whether the caller is on the premium plan.
    pub premium: bool,

    /// Rewrites consumed this week. Always 0 for premium users.
    pub used: u64,

    /// Weekly allowance; `null` for premium users.
    pub limit: Option<u64>,

    /// Rewrites left this week; `null` for premium users.
    pub remaining: Option<u64>,

    /// Monday the current quota week started on.
    pub period_key: String,
}

/// `GET /v1/usage` - the caller's weekly usage summary.
///
/// Premium users never touch the ledger; their summary is a constant
/// shape with `limit` and `remaining` nulled out.
pub async fn usage(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UsageResponse>, ApiError> {
    let user = state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let period = PeriodKey::for_week_of(Utc::now());

    if user.premium {
        return Ok(Json(UsageResponse {
            premium: true,
            used: 0,
            limit: None,
            remaining: None,
            period_key: period.to_string(),
        }));
    }

    let limit = u64::from(state.config.weekly_free_limit);
    let used = state.store.weekly_used(&auth.user_id, &period)?;

    Ok(Json(UsageResponse {
        premium: false,
        used,
        limit: Some(limit),
        remaining: Some(limit.saturating_sub(used)),
        period_key: period.to_string(),
    }))
}
