//! Core types for ProTone.
//!
//! This crate provides the foundational types used throughout the ProTone
//! platform:
//!
//! - **Identifiers**: `UserId`
//! - **Periods**: `PeriodKey` and its Monday-UTC derivation
//! - **Usage**: `UsageRecord`, `UsageReservation`
//! - **Users**: `UserRecord`
//! - **Rewrites**: `Mode`, `Tone`, input limits
//!
//! # Weekly quota
//!
//! Free-tier usage is metered per calendar week. A week is identified by a
//! [`PeriodKey`], the UTC date of its Monday, derived as a pure function
//! of an instant, so reserve and rollback within one request always target
//! the same week even across a boundary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;
pub mod period;
pub mod rewrite;
pub mod usage;
pub mod user;

pub use ids::{IdError, UserId, MAX_USER_ID_LEN};
pub use period::{PeriodKey, PeriodKeyError};
pub use rewrite::{
    Mode, ParseModeError, ParseToneError, Tone, DEFAULT_RECIPIENT, DEFAULT_WEEKLY_LIMIT,
    MAX_INPUT_CHARS, MAX_RECIPIENT_CHARS,
};
pub use usage::{UsageRecord, UsageReservation};
pub use user::UserRecord;
