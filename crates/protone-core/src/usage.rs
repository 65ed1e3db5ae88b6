//! Weekly usage counters and reservation outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PeriodKey, UserId};

/// A persisted usage counter for one (owner, period) pair.
///
/// At most one record exists per pair; the storage layer enforces the
/// compound-key uniqueness. Outside of reserve and rollback nothing
/// mutates `used`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// The quota owner.
    pub user_id: UserId,

    /// The accounting period this counter belongs to.
    pub period_key: PeriodKey,

    /// Reservations committed in this period.
    pub used: u64,

    /// When the counter last changed.
    pub updated_at: DateTime<Utc>,
}

impl UsageRecord {
    /// Create a fresh record with a zero counter.
    #[must_use]
    pub fn new(user_id: UserId, period_key: PeriodKey) -> Self {
        Self {
            user_id,
            period_key,
            used: 0,
            updated_at: Utc::now(),
        }
    }
}

/// Outcome of a reservation attempt.
///
/// `granted=false` is the normal quota-exhausted result, not an error; it
/// is distinguishable from infrastructure failure, which surfaces as a
/// storage error instead. The period key is echoed back so a later
/// rollback can target the same week even if wall-clock time has crossed
/// into the next one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageReservation {
    /// Whether one unit was reserved.
    pub granted: bool,

    /// The counter value after the operation.
    pub used: u64,

    /// Units left in the period (`limit - used`, floored at 0).
    pub remaining: u64,

    /// The period the reservation was attempted in.
    pub period_key: PeriodKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_starts_at_zero() {
        let record = UsageRecord::new(UserId::generate(), "2025-01-06".parse().unwrap());
        assert_eq!(record.used, 0);
    }

    #[test]
    fn reservation_serializes_with_period_key() {
        let reservation = UsageReservation {
            granted: true,
            used: 3,
            remaining: 7,
            period_key: "2025-01-06".parse().unwrap(),
        };
        let json = serde_json::to_value(&reservation).unwrap();
        assert_eq!(json["granted"], true);
        assert_eq!(json["used"], 3);
        assert_eq!(json["remaining"], 7);
        assert_eq!(json["period_key"], "2025-01-06");
    }
}
