//! Client error types.

/// Errors that can occur when using the ProTone client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// The weekly rewrite allowance is spent.
    #[error("weekly limit reached: used={used}, limit={limit}")]
    QuotaExhausted {
        /// Rewrites consumed this week.
        used: u64,
        /// Weekly allowance.
        limit: u64,
    },

    /// Too many requests.
    #[error("rate limited: retry after {retry_after_seconds}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_seconds: u64,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
