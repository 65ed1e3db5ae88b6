//! Stripe integration.
//!
//! Handles the premium subscription lifecycle:
//! - Customer creation with user-id metadata
//! - Subscription Checkout sessions
//! - Billing portal sessions
//! - Webhook signature verification

pub mod client;
pub mod types;

pub use client::{StripeClient, StripeError};
pub use types::*;
