//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary user records, keyed by `user_id`.
    pub const USERS: &str = "users";

    /// Index: user id by email, keyed by the normalized email address.
    /// Value is the `user_id` bytes.
    pub const USERS_BY_EMAIL: &str = "users_by_email";

    /// Index: user id by Stripe customer, keyed by `customer_id`.
    /// Value is the `user_id` bytes.
    pub const USERS_BY_CUSTOMER: &str = "users_by_customer";

    /// Index: user id by Stripe subscription, keyed by `subscription_id`.
    /// Value is the `user_id` bytes.
    pub const USERS_BY_SUBSCRIPTION: &str = "users_by_subscription";

    /// Weekly usage counters, keyed by `user_id || 0x00 || period_key`.
    pub const WEEKLY_USAGE: &str = "weekly_usage";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::USERS,
        cf::USERS_BY_EMAIL,
        cf::USERS_BY_CUSTOMER,
        cf::USERS_BY_SUBSCRIPTION,
        cf::WEEKLY_USAGE,
    ]
}
