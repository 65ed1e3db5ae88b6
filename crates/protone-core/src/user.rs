//! User records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A registered user.
///
/// The record carries the subscription state alongside the identity:
/// `premium` is the unmetered flag flipped by payment-processor webhooks,
/// and the `stripe_*` fields link the user to the processor's customer and
/// subscription objects so webhook events can be resolved back to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// The user id; also the quota-owner key in the usage ledger.
    pub id: UserId,

    /// Sign-in email address, unique across users.
    pub email: String,

    /// Whether the user holds an active paid subscription.
    pub premium: bool,

    /// Stripe customer id, once one has been created.
    pub stripe_customer_id: Option<String>,

    /// Stripe subscription id, while a subscription exists.
    pub stripe_subscription_id: Option<String>,

    /// Price id of the active subscription.
    pub stripe_price_id: Option<String>,

    /// End of the current paid period, as reported by the processor.
    pub stripe_current_period_end: Option<DateTime<Utc>>,

    /// When the user registered.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Create a new free-tier user.
    #[must_use]
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            email: email.into(),
            premium: false,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            stripe_price_id: None,
            stripe_current_period_end: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the weekly quota applies to this user.
    #[must_use]
    pub const fn is_metered(&self) -> bool {
        !self.premium
    }

    /// Clear all subscription state after the processor reports a
    /// cancellation.
    pub fn clear_subscription(&mut self) {
        self.premium = false;
        self.stripe_subscription_id = None;
        self.stripe_price_id = None;
        self.stripe_current_period_end = None;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_is_metered_free_tier() {
        let user = UserRecord::new(UserId::generate(), "a@example.com");
        assert!(!user.premium);
        assert!(user.is_metered());
        assert!(user.stripe_customer_id.is_none());
    }

    #[test]
    fn premium_user_is_unmetered() {
        let mut user = UserRecord::new(UserId::generate(), "a@example.com");
        user.premium = true;
        assert!(!user.is_metered());
    }

    #[test]
    fn clear_subscription_resets_all_linkage() {
        let mut user = UserRecord::new(UserId::generate(), "a@example.com");
        user.premium = true;
        user.stripe_subscription_id = Some("sub_123".into());
        user.stripe_price_id = Some("price_123".into());
        user.stripe_current_period_end = Some(Utc::now());

        user.clear_subscription();

        assert!(!user.premium);
        assert!(user.stripe_subscription_id.is_none());
        assert!(user.stripe_price_id.is_none());
        assert!(user.stripe_current_period_end.is_none());
    }
}
