//! Time-biased UUIDs for client generated keys.
//!
//! The first bytes of the mixed-endian GUID layout carry the creation time,
//! so the hyphenated form reads `YYMMDDHH-MMSS-...` and keys inserted close
//! together cluster in SQL Server's uniqueidentifier ordering.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use uuid::Uuid;

/// A random UUID stamped with the current local time.
pub fn sequential_uuid() -> Uuid {
    sequential_uuid_at(&Local::now())
}

/// A random UUID stamped with `at`.
pub fn sequential_uuid_at<Tz: TimeZone>(at: &DateTime<Tz>) -> Uuid {
    let mut bytes = Uuid::new_v4().to_bytes_le();
    bytes[3] = at.year() as u8;
    bytes[2] = at.month() as u8;
    bytes[1] = at.day() as u8;
    bytes[0] = at.hour() as u8;
    bytes[5] = at.minute() as u8;
    bytes[4] = at.second() as u8;
    Uuid::from_bytes_le(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashSet;

    #[test]
    fn test_time_prefix() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let id = sequential_uuid_at(&at).to_string();
        // 2024 truncates to 0xe8
        assert!(id.starts_with("e803050e-0709-"), "unexpected prefix in {}", id);
    }

    #[test]
    fn test_same_second_stays_unique() {
        let at = Utc.with_ymd_and_hms(2030, 12, 31, 23, 59, 59).unwrap();
        let ids: HashSet<_> = (0..1000).map(|_| sequential_uuid_at(&at)).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.to_string().starts_with("ee0c1f17-3b3b-")));
    }
}
