//! Rewrite backend client.
//!
//! Speaks the OpenAI chat-completions protocol. The base URL is
//! configurable so deployments can point at a proxy or a compatible
//! backend, and tests can point at a local mock.

use std::time::Duration;

use protone_core::{Mode, Tone};

use super::types::{
    BackendErrorResponse, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
};

/// System prompt pinning the model to plain rewriting.
const SYSTEM_PROMPT: &str = "You rewrite messages. Output ONLY the rewritten message. \
     Preserve key details, names, dates, and intent. Do not add disclaimers.";

/// Completion length cap.
const MAX_COMPLETION_TOKENS: u32 = 500;

/// Sampling temperature for fun mode.
const FUN_TEMPERATURE: f32 = 0.9;

/// Sampling temperature for normal mode.
const NORMAL_TEMPERATURE: f32 = 0.4;

/// Errors from the rewrite backend client.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error response.
    #[error("backend error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Human-readable message.
        message: String,
    },

    /// Backend returned no usable completion text.
    #[error("backend returned an empty completion")]
    EmptyCompletion,
}

/// Rewrite backend client.
#[derive(Debug, Clone)]
pub struct RewriteClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl RewriteClient {
    /// Create a new rewrite client.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be constructed, which
    /// only happens when the TLS backend fails to initialize.
    #[must_use]
    pub fn new(base_url: &str, api_key: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    /// Rewrite `text` in the requested mode and tone.
    ///
    /// Returns the first completion choice, trimmed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the backend rejects it, or
    /// the completion comes back empty.
    pub async fn rewrite(
        &self,
        text: &str,
        mode: Mode,
        tone: Tone,
        recipient: &str,
    ) -> Result<String, RewriteError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_user_prompt(text, mode, tone, recipient),
                },
            ],
            temperature: temperature_for(mode),
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<BackendErrorResponse>(&body)
                .ok()
                .and_then(|parsed| parsed.error.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(RewriteError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(RewriteError::EmptyCompletion);
        }
        Ok(trimmed.to_string())
    }
}

/// Pick the sampling temperature for a mode.
const fn temperature_for(mode: Mode) -> f32 {
    match mode {
        Mode::Fun => FUN_TEMPERATURE,
        Mode::Normal => NORMAL_TEMPERATURE,
    }
}

/// Assemble the user prompt the backend sees.
fn build_user_prompt(text: &str, mode: Mode, tone: Tone, recipient: &str) -> String {
    format!("Recipient: {recipient}\nMode: {mode}\nTone: {tone}\n\nMessage to rewrite:\n{text}")
}
