//! Rate limiter service client and per-route policies.
//!
//! Limiting is delegated to an external sliding-window service; this
//! module only asks it questions. Every protected route is checked twice,
//! once keyed by user id and once by client IP. When the limiter is not
//! configured or cannot be reached, requests pass through.

use std::time::Duration;

use axum::http::HeaderMap;
use protone_core::UserId;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Per-route sliding-window limits, applied per user and per client IP.
#[derive(Debug, Clone, Copy)]
pub struct RatePolicy {
    /// Key prefix naming the protected route.
    pub name: &'static str,

    /// Requests allowed per user in the window.
    pub user_limit: u32,

    /// Per-user window length in seconds.
    pub user_window_seconds: u64,

    /// Requests allowed per client IP in the window.
    pub ip_limit: u32,

    /// Per-IP window length in seconds.
    pub ip_window_seconds: u64,
}

/// Rewrite endpoint policy.
pub const REWRITE_POLICY: RatePolicy = RatePolicy {
    name: "rewrite",
    user_limit: 5,
    user_window_seconds: 60,
    ip_limit: 10,
    ip_window_seconds: 60,
};

/// Checkout endpoint policy.
pub const CHECKOUT_POLICY: RatePolicy = RatePolicy {
    name: "checkout",
    user_limit: 3,
    user_window_seconds: 600,
    ip_limit: 10,
    ip_window_seconds: 600,
};

/// Billing portal endpoint policy.
pub const PORTAL_POLICY: RatePolicy = RatePolicy {
    name: "portal",
    user_limit: 10,
    user_window_seconds: 600,
    ip_limit: 30,
    ip_window_seconds: 600,
};

/// Errors from the rate limiter client.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Limiter returned a non-success status.
    #[error("limiter returned HTTP {0}")]
    Api(u16),
}

#[derive(Debug, Serialize)]
struct CheckRequest<'a> {
    key: &'a str,
    limit: u32,
    window_seconds: u64,
}

/// Limiter verdict for one key.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitDecision {
    /// Whether the request fits in the window.
    pub allowed: bool,

    /// Seconds until the window frees up, when denied.
    #[serde(default)]
    pub retry_after_seconds: Option<u64>,
}

/// Rate limiter service client.
#[derive(Debug, Clone)]
pub struct RateLimitClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RateLimitClient {
    /// Create a new rate limiter client.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be constructed, which
    /// only happens when the TLS backend fails to initialize.
    #[must_use]
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Ask the limiter whether one more hit on `key` fits in the window.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the limiter responds with
    /// a non-success status.
    pub async fn check(
        &self,
        key: &str,
        limit: u32,
        window_seconds: u64,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let mut request = self
            .client
            .post(format!("{}/check", self.base_url))
            .json(&CheckRequest {
                key,
                limit,
                window_seconds,
            });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RateLimitError::Api(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

/// Enforce a policy for one request, keyed by user and by client IP.
///
/// Denials map to [`ApiError::RateLimited`]. An unconfigured limiter
/// lets everything through.
///
/// # Errors
///
/// Returns [`ApiError::RateLimited`] when either window is exhausted.
pub async fn enforce(
    state: &AppState,
    policy: &RatePolicy,
    user_id: &UserId,
    headers: &HeaderMap,
) -> Result<(), ApiError> {
    let limiter = match &state.limiter {
        Some(limiter) => limiter,
        None => return Ok(()),
    };

    let user_key = format!("{}:user:{}", policy.name, user_id);
    check_key(
        limiter,
        &user_key,
        policy.user_limit,
        policy.user_window_seconds,
    )
    .await?;

    let ip_key = format!("{}:ip:{}", policy.name, client_ip(headers));
    check_key(limiter, &ip_key, policy.ip_limit, policy.ip_window_seconds).await?;

    Ok(())
}

async fn check_key(
    limiter: &RateLimitClient,
    key: &str,
    limit: u32,
    window_seconds: u64,
) -> Result<(), ApiError> {
    match limiter.check(key, limit, window_seconds).await {
        Ok(decision) if decision.allowed => Ok(()),
        Ok(decision) => Err(ApiError::RateLimited {
            retry_after_seconds: decision.retry_after_seconds.unwrap_or(window_seconds),
        }),
        Err(e) => {
            // Fail open when the limiter itself is unavailable.
            tracing::warn!(error = %e, key = %key, "Rate limiter check failed - allowing request");
            Ok(())
        }
    }
}

/// Best-effort client IP: first `x-forwarded-for` hop, then `x-real-ip`,
/// then `"unknown"`.
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map_or_else(|| "unknown".to_string(), ToString::to_string)
}
