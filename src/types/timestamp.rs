//! Date <-> epoch-seconds helpers
//!
//! Date columns are stored as whole seconds since the Unix epoch, so any
//! sub-second part is dropped on the way in.

use crate::error::{MiniDbError, Result};
use chrono::{DateTime, SubsecRound, Utc};

/// Seconds since Unix epoch (fraction truncated)
pub fn to_epoch_secs(date: &DateTime<Utc>) -> i64 {
    date.timestamp()
}

/// Inverse of [`to_epoch_secs`]
pub fn from_epoch_secs(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| MiniDbError::TypeError(format!("epoch seconds out of range: {}", secs)))
}

/// What a date looks like after a round trip through storage
pub fn truncate_to_secs(date: &DateTime<Utc>) -> DateTime<Utc> {
    date.trunc_subsecs(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_epoch_secs_creation() {
        let date = Utc.with_ymd_and_hms(2020, 3, 26, 15, 48, 8).unwrap();
        assert_eq!(to_epoch_secs(&date), 1_585_237_688);
        assert_eq!(from_epoch_secs(1_585_237_688).unwrap(), date);
    }

    #[test]
    fn test_truncation() {
        let date = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::microseconds(999_999);
        let truncated = truncate_to_secs(&date);
        assert_eq!(truncated, Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(from_epoch_secs(to_epoch_secs(&date)).unwrap(), truncated);
    }

    #[test]
    fn test_pre_epoch() {
        let date = Utc.with_ymd_and_hms(1969, 7, 20, 20, 17, 40).unwrap();
        assert_eq!(from_epoch_secs(to_epoch_secs(&date)).unwrap(), date);
    }

    #[test]
    fn test_out_of_range() {
        assert!(from_epoch_secs(i64::MAX).is_err());
    }
}
