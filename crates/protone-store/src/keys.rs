//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding keys used in column families.

use protone_core::{PeriodKey, UserId};

/// Byte separating the owner prefix from the period suffix in usage keys.
///
/// `UserId` only admits printable ASCII, so NUL can never appear inside the
/// owner prefix and the split is unambiguous.
const USAGE_KEY_SEPARATOR: u8 = 0x00;

/// Create a user key from a user ID.
#[must_use]
pub fn user_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create an email index key from a normalized email address.
#[must_use]
pub fn email_index_key(email: &str) -> Vec<u8> {
    email.as_bytes().to_vec()
}

/// Create a customer index key from a Stripe customer ID.
#[must_use]
pub fn customer_index_key(customer_id: &str) -> Vec<u8> {
    customer_id.as_bytes().to_vec()
}

/// Create a subscription index key from a Stripe subscription ID.
#[must_use]
pub fn subscription_index_key(subscription_id: &str) -> Vec<u8> {
    subscription_id.as_bytes().to_vec()
}

/// Create a weekly usage key for one (owner, period) counter.
///
/// Format: `user_id || 0x00 || period_key (YYYY-MM-DD)`
#[must_use]
pub fn usage_key(owner: &UserId, period: &PeriodKey) -> Vec<u8> {
    let period = period.to_string();
    let mut key = Vec::with_capacity(owner.as_bytes().len() + 1 + period.len());
    key.extend_from_slice(owner.as_bytes());
    key.push(USAGE_KEY_SEPARATOR);
    key.extend_from_slice(period.as_bytes());
    key
}
