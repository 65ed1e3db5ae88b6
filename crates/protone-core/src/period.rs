//! Weekly accounting periods.
//!
//! A period is one calendar week, Monday 00:00:00 UTC inclusive through the
//! next Monday exclusive, identified by the UTC date of its Monday.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A weekly accounting period key.
///
/// The string form is the `YYYY-MM-DD` date of the week's Monday. The key
/// partitions usage counters: a new week implicitly starts a fresh counter
/// at zero, and old rows stay behind under their old key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodKey(NaiveDate);

impl PeriodKey {
    /// Derive the key for the week containing `instant`.
    ///
    /// Pure function of its argument: the most recent Monday (UTC) at or
    /// before the instant. Callers pass the wall clock in explicitly and
    /// reuse the derived key for paired operations, so a reserve/rollback
    /// pair never straddles two weeks.
    #[must_use]
    pub fn for_week_of(instant: DateTime<Utc>) -> Self {
        let date = instant.date_naive();
        let days_from_monday = i64::from(date.weekday().num_days_from_monday());
        Self(date - Duration::days(days_from_monday))
    }

    /// The Monday date identifying this period.
    #[must_use]
    pub const fn as_date(&self) -> NaiveDate {
        self.0
    }
}

impl FromStr for PeriodKey {
    type Err = PeriodKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date =
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| PeriodKeyError::Malformed)?;
        // Only Mondays can come out of the derivation; anything else is a
        // caller contract violation.
        if date.weekday() != Weekday::Mon {
            return Err(PeriodKeyError::NotAWeekStart);
        }
        Ok(Self(date))
    }
}

impl fmt::Debug for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeriodKey({})", self.0.format("%Y-%m-%d"))
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl TryFrom<String> for PeriodKey {
    type Error = PeriodKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PeriodKey> for String {
    fn from(key: PeriodKey) -> Self {
        key.to_string()
    }
}

/// Errors that can occur when parsing period keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodKeyError {
    /// The input is not a `YYYY-MM-DD` date.
    #[error("invalid period key, expected a YYYY-MM-DD date")]
    Malformed,

    /// The date is valid but not a Monday.
    #[error("period key is not a Monday")]
    NotAWeekStart,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn midweek_maps_to_preceding_monday() {
        // Wednesday 2025-01-08 belongs to the week of Monday 2025-01-06.
        let key = PeriodKey::for_week_of(instant(2025, 1, 8, 10, 0, 0));
        assert_eq!(key.to_string(), "2025-01-06");
    }

    #[test]
    fn monday_midnight_maps_to_itself() {
        let key = PeriodKey::for_week_of(instant(2025, 1, 6, 0, 0, 0));
        assert_eq!(key.to_string(), "2025-01-06");
    }

    #[test]
    fn sunday_last_second_still_same_week() {
        let key = PeriodKey::for_week_of(instant(2025, 1, 12, 23, 59, 59));
        assert_eq!(key.to_string(), "2025-01-06");
    }

    #[test]
    fn next_monday_midnight_starts_new_week() {
        let key = PeriodKey::for_week_of(instant(2025, 1, 13, 0, 0, 0));
        assert_eq!(key.to_string(), "2025-01-13");
    }

    #[test]
    fn stable_across_the_whole_week() {
        let monday = PeriodKey::for_week_of(instant(2025, 1, 6, 0, 0, 0));
        for day in 6..=12 {
            let key = PeriodKey::for_week_of(instant(2025, 1, day, 15, 30, 0));
            assert_eq!(key, monday);
        }
    }

    #[test]
    fn year_boundary_week() {
        // Wednesday 2025-01-01 belongs to the week of Monday 2024-12-30.
        let key = PeriodKey::for_week_of(instant(2025, 1, 1, 12, 0, 0));
        assert_eq!(key.to_string(), "2024-12-30");
    }

    #[test]
    fn parse_roundtrip() {
        let key: PeriodKey = "2025-01-06".parse().unwrap();
        assert_eq!(key.to_string(), "2025-01-06");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            "not-a-date".parse::<PeriodKey>(),
            Err(PeriodKeyError::Malformed)
        );
        assert_eq!(
            "2025-13-40".parse::<PeriodKey>(),
            Err(PeriodKeyError::Malformed)
        );
    }

    #[test]
    fn parse_rejects_non_monday() {
        // 2025-01-08 is a Wednesday.
        assert_eq!(
            "2025-01-08".parse::<PeriodKey>(),
            Err(PeriodKeyError::NotAWeekStart)
        );
    }

    #[test]
    fn serde_json_roundtrip() {
        let key = PeriodKey::for_week_of(instant(2025, 1, 8, 10, 0, 0));
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2025-01-06\"");
        let parsed: PeriodKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, parsed);
    }
}
