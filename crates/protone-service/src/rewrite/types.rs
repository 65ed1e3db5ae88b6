//! Chat-completion wire types for the rewrite backend.

use serde::{Deserialize, Serialize};

/// Request body for `POST {base}/chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    /// Model name.
    pub model: String,

    /// Conversation messages, system prompt first.
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature.
    pub temperature: f32,

    /// Completion length cap.
    pub max_tokens: u32,
}

/// A single chat message.
#[derive(Debug, Serialize)]
pub struct ChatMessage {
    /// Message role ("system" or "user").
    pub role: String,

    /// Message text.
    pub content: String,
}

/// Response body for `POST {base}/chat/completions`.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    /// Completion choices; the first one is used.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// One completion choice.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// The generated message.
    pub message: ChatChoiceMessage,
}

/// Generated message content of a choice.
#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    /// Message text. Backends may send `null` for refused completions.
    #[serde(default)]
    pub content: Option<String>,
}

/// Error response from the backend.
#[derive(Debug, Deserialize)]
pub struct BackendErrorResponse {
    /// Error details.
    pub error: BackendErrorDetail,
}

/// Error detail from the backend.
#[derive(Debug, Deserialize)]
pub struct BackendErrorDetail {
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,

    /// Error type (e.g. `invalid_request_error`).
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}
