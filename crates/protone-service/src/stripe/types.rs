//! Stripe API object types.
//!
//! Only the fields this service reads are modeled; everything else in the
//! Stripe response is ignored during deserialization.

use serde::Deserialize;

/// A Stripe customer.
#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    /// Customer id (`cus_...`).
    pub id: String,

    /// Email on the customer record.
    #[serde(default)]
    pub email: Option<String>,

    /// Arbitrary key-value metadata; this service stores `user_id` here.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A Stripe Checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session id (`cs_...`).
    pub id: String,

    /// Hosted payment page URL. Present while the session is open.
    #[serde(default)]
    pub url: Option<String>,

    /// Customer the session was created for.
    #[serde(default)]
    pub customer: Option<String>,

    /// Our user id, echoed back in webhook events.
    #[serde(default)]
    pub client_reference_id: Option<String>,

    /// Session status ("open", "complete", "expired").
    #[serde(default)]
    pub status: Option<String>,

    /// Arbitrary key-value metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A Stripe billing portal session.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingPortalSession {
    /// Session id (`bps_...`).
    pub id: String,

    /// Hosted portal URL.
    pub url: String,
}

/// Stripe API error response.
#[derive(Debug, Deserialize)]
pub struct StripeErrorResponse {
    /// Error details.
    pub error: StripeErrorDetail,
}

/// Stripe API error detail.
#[derive(Debug, Deserialize)]
pub struct StripeErrorDetail {
    /// Error type (e.g. `invalid_request_error`).
    #[serde(rename = "type")]
    pub error_type: String,

    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,

    /// Machine-readable error code.
    #[serde(default)]
    pub code: Option<String>,
}
