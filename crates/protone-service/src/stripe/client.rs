//! Stripe API client.
//!
//! Talks to the Stripe REST API directly with form-encoded requests; no
//! SDK crate sits in between. Only the endpoints the subscription flow
//! needs are implemented.

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::types::{BillingPortalSession, CheckoutSession, Customer, StripeErrorResponse};
use crate::crypto;

/// Errors from the Stripe API client.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe returned an error response.
    #[error("stripe error ({error_type}): {message}")]
    Api {
        /// Stripe error type.
        error_type: String,
        /// Human-readable message.
        message: String,
        /// Machine-readable code, when present.
        code: Option<String>,
    },

    /// Webhook signature did not verify.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// Client is missing required configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_key: String,
    webhook_secret: Option<String>,
}

impl StripeClient {
    const BASE_URL: &'static str = "https://api.stripe.com/v1";

    /// Create a new Stripe client.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be constructed, which
    /// only happens when the TLS backend fails to initialize.
    #[must_use]
    pub fn new(api_key: String, webhook_secret: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            api_key,
            webhook_secret,
        }
    }

    /// Create a customer carrying our user id in its metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it.
    pub async fn create_customer(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<Customer, StripeError> {
        let params: Vec<(&str, String)> = vec![
            ("email", email.to_string()),
            ("metadata[user_id]", user_id.to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/customers", Self::BASE_URL))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Update an existing customer's email and user-id metadata.
    ///
    /// Called before checkout so a customer created under an old email
    /// still maps back to the right user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it.
    pub async fn update_customer(
        &self,
        customer_id: &str,
        user_id: &str,
        email: &str,
    ) -> Result<Customer, StripeError> {
        let params: Vec<(&str, String)> = vec![
            ("email", email.to_string()),
            ("metadata[user_id]", user_id.to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/customers/{customer_id}", Self::BASE_URL))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Create a subscription-mode Checkout session for the premium plan.
    ///
    /// The user id rides along twice (`client_reference_id` and
    /// `metadata[user_id]`) so the completion webhook can resolve the
    /// user even if one of the fields is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it.
    pub async fn create_subscription_checkout(
        &self,
        customer_id: &str,
        user_id: &str,
        price_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let params: Vec<(&str, String)> = vec![
            ("mode", "subscription".to_string()),
            ("customer", customer_id.to_string()),
            ("client_reference_id", user_id.to_string()),
            ("metadata[user_id]", user_id.to_string()),
            ("line_items[0][price]", price_id.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("allow_promotion_codes", "true".to_string()),
            ("success_url", success_url.to_string()),
            ("cancel_url", cancel_url.to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/checkout/sessions", Self::BASE_URL))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Create a billing portal session for an existing customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it.
    pub async fn create_billing_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<BillingPortalSession, StripeError> {
        let params: Vec<(&str, String)> = vec![
            ("customer", customer_id.to_string()),
            ("return_url", return_url.to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/billing_portal/sessions", Self::BASE_URL))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Verify a Stripe webhook signature header against the raw payload.
    ///
    /// The header carries a timestamp and one or more `v1` signatures,
    /// e.g. `t=1700000000,v1=abc...`. The signed message is
    /// `"{timestamp}.{payload}"`; verification passes if any `v1` entry
    /// matches.
    ///
    /// # Errors
    ///
    /// Returns [`StripeError::Configuration`] if no webhook secret is
    /// configured, and [`StripeError::InvalidSignature`] if the header is
    /// malformed or no signature matches.
    pub fn verify_webhook_signature(
        &self,
        payload: &str,
        signature_header: &str,
    ) -> Result<(), StripeError> {
        let secret = self.webhook_secret.as_ref().ok_or_else(|| {
            StripeError::Configuration("webhook secret not configured".to_string())
        })?;

        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();
        for part in signature_header.split(',') {
            let mut kv = part.trim().splitn(2, '=');
            match (kv.next(), kv.next()) {
                (Some("t"), Some(value)) => timestamp = Some(value),
                (Some("v1"), Some(value)) => signatures.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(StripeError::InvalidSignature)?;
        if signatures.is_empty() {
            return Err(StripeError::InvalidSignature);
        }

        let signed_payload = format!("{timestamp}.{payload}");
        let expected = crypto::hmac_sha256_hex(secret, &signed_payload);

        if signatures
            .iter()
            .any(|sig| crypto::constant_time_eq(&expected, sig))
        {
            Ok(())
        } else {
            Err(StripeError::InvalidSignature)
        }
    }

    /// Parse a Stripe response, mapping error bodies to [`StripeError::Api`].
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<StripeErrorResponse>(&body) {
                Ok(parsed) => Err(StripeError::Api {
                    error_type: parsed.error.error_type,
                    message: parsed
                        .error
                        .message
                        .unwrap_or_else(|| format!("HTTP {status}")),
                    code: parsed.error.code,
                }),
                Err(_) => Err(StripeError::Api {
                    error_type: "unknown".to_string(),
                    message: format!("HTTP {status}"),
                    code: None,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> StripeClient {
        StripeClient::new("sk_test_123".to_string(), Some("whsec_test".to_string()))
    }

    fn sign(payload: &str, timestamp: &str) -> String {
        let signed = format!("{timestamp}.{payload}");
        crypto::hmac_sha256_hex("whsec_test", &signed)
    }

    #[test]
    fn accepts_valid_signature() {
        let client = test_client();
        let payload = r#"{"id":"evt_123","type":"checkout.session.completed"}"#;
        let header = format!("t=1700000000,v1={}", sign(payload, "1700000000"));
        assert!(client.verify_webhook_signature(payload, &header).is_ok());
    }

    #[test]
    fn accepts_any_matching_v1_entry() {
        let client = test_client();
        let payload = r#"{"id":"evt_123"}"#;
        let header = format!("t=1700000000,v1=deadbeef,v1={}", sign(payload, "1700000000"));
        assert!(client.verify_webhook_signature(payload, &header).is_ok());
    }

    #[test]
    fn rejects_tampered_payload() {
        let client = test_client();
        let header = format!("t=1700000000,v1={}", sign(r#"{"id":"evt_123"}"#, "1700000000"));
        let result = client.verify_webhook_signature(r#"{"id":"evt_999"}"#, &header);
        assert!(matches!(result, Err(StripeError::InvalidSignature)));
    }

    #[test]
    fn rejects_malformed_header() {
        let client = test_client();
        let result = client.verify_webhook_signature("{}", "not-a-signature-header");
        assert!(matches!(result, Err(StripeError::InvalidSignature)));
    }

    #[test]
    fn verification_requires_secret() {
        let client = StripeClient::new("sk_test_123".to_string(), None);
        let result = client.verify_webhook_signature("{}", "t=1,v1=ab");
        assert!(matches!(result, Err(StripeError::Configuration(_))));
    }
}
