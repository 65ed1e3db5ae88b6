//! `RocksDB` storage layer for ProTone.
//!
//! This crate provides persistent storage for user records and weekly usage
//! counters using `RocksDB` with column families for efficient indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `users`: Primary user records, keyed by `user_id`
//! - `users_by_email`: Index for email uniqueness and lookup
//! - `users_by_customer`: Index for resolving Stripe customers to users
//! - `users_by_subscription`: Index for resolving Stripe subscriptions to users
//! - `weekly_usage`: Per-(user, week) quota counters
//!
//! # Example
//!
//! ```no_run
//! use protone_store::{RocksStore, Store};
//! use protone_core::{PeriodKey, UserId};
//! use chrono::Utc;
//!
//! let store = RocksStore::open("/tmp/protone-db").unwrap();
//!
//! // Reserve one unit of weekly quota
//! let owner = UserId::generate();
//! let period = PeriodKey::for_week_of(Utc::now());
//! let reservation = store.reserve_usage(&owner, &period, 10).unwrap();
//! assert!(reservation.granted);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use protone_core::{PeriodKey, UsageReservation, UserId, UserRecord};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert a new user record.
    ///
    /// This also maintains the email index.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EmailTaken` if another user already registered
    /// the email, or an error if the database operation fails.
    fn create_user(&self, user: &UserRecord) -> Result<()>;

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, user_id: &UserId) -> Result<Option<UserRecord>>;

    /// Update an existing user record.
    ///
    /// Index entries for email, customer, and subscription are kept in sync
    /// with the previous version of the record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user doesn't exist.
    fn update_user(&self, user: &UserRecord) -> Result<()>;

    /// Look up a user by normalized email address.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Look up a user by Stripe customer ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_user_by_customer(&self, customer_id: &str) -> Result<Option<UserRecord>>;

    /// Look up a user by Stripe subscription ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_user_by_subscription(&self, subscription_id: &str) -> Result<Option<UserRecord>>;

    // =========================================================================
    // Weekly Usage Operations
    // =========================================================================

    /// Read the committed usage count for one (owner, period).
    ///
    /// Returns 0 if no counter exists. Read-only; never creates a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn weekly_used(&self, owner: &UserId, period: &PeriodKey) -> Result<u64>;

    /// Reserve one unit of weekly quota for (owner, period).
    ///
    /// Atomically increments the counter if it is below `limit`. When the
    /// counter is already at or above `limit`, nothing is mutated and the
    /// reservation comes back with `granted = false`; denial is a normal
    /// outcome, not an error. Concurrent calls against the same key are
    /// serialized, so the stored count never exceeds `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails. No reservation is
    /// granted in that case.
    fn reserve_usage(
        &self,
        owner: &UserId,
        period: &PeriodKey,
        limit: u32,
    ) -> Result<UsageReservation>;

    /// Return one previously reserved unit for (owner, period).
    ///
    /// Decrements the counter, floored at zero. A counter that reaches zero
    /// is deleted; subsequent reads behave as if it never existed. Returns
    /// the count after the decrement.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn rollback_usage(&self, owner: &UserId, period: &PeriodKey) -> Result<u64>;
}
