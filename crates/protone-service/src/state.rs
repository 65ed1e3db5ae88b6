//! Application state.

use std::sync::Arc;

use protone_store::RocksStore;

use crate::config::ServiceConfig;
use crate::ratelimit::RateLimitClient;
use crate::rewrite::RewriteClient;
use crate::stripe::StripeClient;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// `RocksDB` store.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Rewrite backend client (optional).
    pub rewriter: Option<Arc<RewriteClient>>,

    /// Stripe client (optional).
    pub stripe: Option<Arc<StripeClient>>,

    /// Rate limiter client (optional).
    pub limiter: Option<Arc<RateLimitClient>>,
}

impl AppState {
    /// Create application state, constructing integration clients from
    /// whatever the configuration provides.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        if config.session_secret.is_none() {
            tracing::warn!("SESSION_SECRET not set - session token auth is disabled");
        }

        let rewriter = config.openai_api_key.as_ref().map(|key| {
            tracing::info!(model = %config.openai_model, "Rewrite backend enabled");
            Arc::new(RewriteClient::new(
                &config.openai_base_url,
                key.clone(),
                config.openai_model.clone(),
            ))
        });
        if rewriter.is_none() {
            tracing::warn!("OPENAI_API_KEY not set - rewrite requests will fail");
        }

        let stripe = config.stripe_api_key.as_ref().map(|key| {
            tracing::info!("Stripe integration enabled");
            Arc::new(StripeClient::new(
                key.clone(),
                config.stripe_webhook_secret.clone(),
            ))
        });
        if stripe.is_none() {
            tracing::warn!("Stripe not configured - billing endpoints will be unavailable");
        }

        let limiter = config.rate_limit_url.as_ref().map(|url| {
            tracing::info!("Rate limiter enabled");
            Arc::new(RateLimitClient::new(url, config.rate_limit_token.clone()))
        });
        if limiter.is_none() {
            tracing::warn!("RATE_LIMIT_URL not set - request rate limiting is disabled");
        }

        Self {
            store,
            config,
            rewriter,
            stripe,
            limiter,
        }
    }
}
