//! ProTone HTTP client implementation.

use reqwest::Client;
use std::time::Duration;

use crate::error::ClientError;
use crate::types::{
    ApiErrorResponse, RedirectLink, RewriteRequest, RewriteResult, UsageSummary, UserProfile,
};

/// ProTone API client.
///
/// Most endpoints act on the authenticated user, so the client carries
/// the session token issued at login. [`ProToneClient::register`] is the
/// only call that works without one.
#[derive(Debug, Clone)]
pub struct ProToneClient {
    client: Client,
    base_url: String,
    session_token: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
}

impl ProToneClient {
    /// Create an unauthenticated client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the ProTone service (e.g., `"https://api.protone.app"`)
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a client acting as the user the session token belongs to.
    #[must_use]
    pub fn with_token(base_url: impl Into<String>, session_token: impl Into<String>) -> Self {
        Self::with_options(base_url, ClientOptions::with_session_token(session_token))
    }

    /// Create a client with custom options.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with default settings).
    #[must_use]
    pub fn with_options(base_url: impl Into<String>, options: ClientOptions) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_token: options.session_token,
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the email is invalid, or
    /// the email is already registered.
    pub async fn register(&self, email: &str) -> Result<UserProfile, ClientError> {
        let url = format!("{}/v1/users", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&RegisterRequest { email })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Fetch the authenticated user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if no session token is set or the request fails.
    pub async fn me(&self) -> Result<UserProfile, ClientError> {
        let url = format!("{}/v1/users/me", self.base_url);
        let token = self.session_token()?;

        let response = self
            .client
            .get(&url)
            .header("authorization", format!("Bearer {token}"))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Fetch the authenticated user's weekly usage.
    ///
    /// # Errors
    ///
    /// Returns an error if no session token is set or the request fails.
    pub async fn usage(&self) -> Result<UsageSummary, ClientError> {
        let url = format!("{}/v1/usage", self.base_url);
        let token = self.session_token()?;

        let response = self
            .client
            .get(&url)
            .header("authorization", format!("Bearer {token}"))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Rewrite a message.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::QuotaExhausted`] when the weekly allowance
    /// is spent, [`ClientError::RateLimited`] when requests come too
    /// fast, and other errors for transport or validation failures.
    pub async fn rewrite(&self, request: &RewriteRequest) -> Result<RewriteResult, ClientError> {
        let url = format!("{}/v1/rewrite", self.base_url);
        let token = self.session_token()?;

        let response = self
            .client
            .post(&url)
            .header("authorization", format!("Bearer {token}"))
            .json(request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Start a subscription checkout and get the hosted page to redirect to.
    ///
    /// # Errors
    ///
    /// Returns an error if no session token is set, the user is already
    /// premium, or billing is not configured on the server.
    pub async fn checkout(&self) -> Result<RedirectLink, ClientError> {
        let url = format!("{}/v1/checkout", self.base_url);
        let token = self.session_token()?;

        let response = self
            .client
            .post(&url)
            .header("authorization", format!("Bearer {token}"))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Open the billing portal for subscription management.
    ///
    /// # Errors
    ///
    /// Returns an error if no session token is set or the user has no
    /// billing account yet.
    pub async fn billing_portal(&self) -> Result<RedirectLink, ClientError> {
        let url = format!("{}/v1/billing-portal", self.base_url);
        let token = self.session_token()?;

        let response = self
            .client
            .post(&url)
            .header("authorization", format!("Bearer {token}"))
            .send()
            .await?;

        self.handle_response(response).await
    }

    fn session_token(&self) -> Result<&str, ClientError> {
        self.session_token
            .as_deref()
            .ok_or_else(|| ClientError::Configuration("session token not set".to_string()))
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let retry_after_header = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        tracing::debug!(status = %status, "ProTone API request failed");

        // Try to parse error response
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let code = api_error.error.code.as_str();
                let message = api_error.error.message;
                let details = api_error.error.details.as_ref();

                // Map specific error codes to typed errors
                match code {
                    "quota_exhausted" => Err(ClientError::QuotaExhausted {
                        used: detail_u64(details, "used").unwrap_or(0),
                        limit: detail_u64(details, "limit").unwrap_or(0),
                    }),
                    "rate_limited" => Err(ClientError::RateLimited {
                        retry_after_seconds: detail_u64(details, "retry_after_seconds")
                            .or(retry_after_header)
                            .unwrap_or(0),
                    }),
                    _ => Err(ClientError::Api {
                        code: code.to_string(),
                        message,
                        status: status.as_u16(),
                    }),
                }
            }
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

fn detail_u64(details: Option<&serde_json::Value>, key: &str) -> Option<u64> {
    details
        .and_then(|d| d.get(key))
        .and_then(serde_json::Value::as_u64)
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// Session token for authenticated endpoints.
    pub session_token: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            session_token: None,
        }
    }
}

impl ClientOptions {
    /// Create options carrying a session token.
    #[must_use]
    pub fn with_session_token(token: impl Into<String>) -> Self {
        Self {
            session_token: Some(token.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = ProToneClient::new("http://localhost:8080");
        assert_eq!(client.base_url, "http://localhost:8080");
        assert!(client.session_token.is_none());
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = ProToneClient::new("http://localhost:8080/");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn client_carries_session_token() {
        let client = ProToneClient::with_token("http://localhost:8080", "tok-123");
        assert_eq!(client.session_token.as_deref(), Some("tok-123"));
    }
}
