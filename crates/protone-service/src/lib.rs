//! ProTone API service.
//!
//! HTTP surface for the ProTone rewriting product:
//! - User registration and profiles
//! - Weekly usage metering for the free tier
//! - Message rewriting through an OpenAI-compatible backend
//! - Stripe subscription billing and webhooks
//! - Optional external rate limiting

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Webhook handlers need async for consistency

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod ratelimit;
pub mod rewrite;
pub mod routes;
pub mod state;
pub mod stripe;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
