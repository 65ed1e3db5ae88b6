//! Request and response types for the ProTone client.

use chrono::{DateTime, Utc};
use protone_core::{Mode, Tone};
use serde::{Deserialize, Serialize};

/// A user profile as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    /// User id.
    pub id: String,
    /// Normalized email address.
    pub email: String,
    /// Whether the user is on the premium plan.
    pub premium: bool,
    /// Whether a billing account is linked.
    pub billing_connected: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Weekly usage summary.
///
/// For premium users `limit` and `remaining` are `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageSummary {
    /// Whether the user is on the premium plan.
    pub premium: bool,
    /// Rewrites consumed this week.
    pub used: u64,
    /// Weekly allowance, absent for premium users.
    pub limit: Option<u64>,
    /// Rewrites left this week, absent for premium users.
    pub remaining: Option<u64>,
    /// The week the counters belong to (Monday, `YYYY-MM-DD`).
    pub period_key: String,
}

/// A rewrite request.
#[derive(Debug, Clone, Serialize)]
pub struct RewriteRequest {
    /// The message to rewrite.
    pub text: String,
    /// Rewrite register.
    pub mode: Mode,
    /// Rewrite tone; must belong to `mode`.
    pub tone: Tone,
    /// Who the message is for. The server defaults this when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
}

impl RewriteRequest {
    /// Build a request with the server-side default recipient.
    #[must_use]
    pub fn new(text: impl Into<String>, mode: Mode, tone: Tone) -> Self {
        Self {
            text: text.into(),
            mode,
            tone,
            recipient: None,
        }
    }

    /// Name the recipient of the message.
    #[must_use]
    pub fn for_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }
}

/// A completed rewrite with the caller's updated quota.
#[derive(Debug, Clone, Deserialize)]
pub struct RewriteResult {
    /// The rewritten message.
    pub result: String,
    /// Whether the user is on the premium plan.
    pub premium: bool,
    /// Rewrites consumed this week, including this one.
    pub used: u64,
    /// Weekly allowance, absent for premium users.
    pub limit: Option<u64>,
    /// Rewrites left this week, absent for premium users.
    pub remaining: Option<u64>,
}

/// A hosted page the user should be redirected to.
#[derive(Debug, Clone, Deserialize)]
pub struct RedirectLink {
    /// The page URL.
    pub url: String,
}

/// API error response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorBody,
}

/// API error body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
    /// Additional details.
    pub details: Option<serde_json::Value>,
}
