//! Time-of-day helpers shared by the normalizer and the live clock.
//!
//! A location's wall-clock time is obtained by shifting the absolute UTC
//! instant by the location's offset and then reading the shifted instant back
//! as UTC. No viewer-local timezone is ever consulted.

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};

/// Wall-clock time at a location `offset_secs` ahead of UTC, for the instant
/// `utc_secs` seconds after the epoch.
///
/// Returns `None` when the shifted instant is outside chrono's range.
pub fn time_of_day(utc_secs: i64, offset_secs: i64) -> Option<NaiveTime> {
    let shifted = utc_secs.checked_add(offset_secs)?;
    DateTime::<Utc>::from_timestamp(shifted, 0).map(|dt| dt.time())
}

/// Zero-padded 24-hour `HH:MM`.
pub fn format_hh_mm(utc_secs: i64, offset_secs: i64) -> Option<String> {
    time_of_day(utc_secs, offset_secs).map(|t| t.format("%H:%M").to_string())
}

/// Zero-padded 24-hour `HH:MM:SS` for `now` at the given offset.
///
/// Returns `None` when the shifted instant is outside chrono's range.
pub fn format_hh_mm_ss(now: DateTime<Utc>, offset_secs: i64) -> Option<String> {
    let shifted = now.checked_add_signed(TimeDelta::try_seconds(offset_secs)?)?;
    Some(shifted.format("%H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2023-11-14T22:13:20Z
    const T: i64 = 1_700_000_000;
    // 2023-11-14T00:00:00Z
    const MIDNIGHT: i64 = 1_699_920_000;

    #[test]
    fn zero_offset_is_plain_utc() {
        assert_eq!(format_hh_mm(T, 0).as_deref(), Some("22:13"));
    }

    #[test]
    fn negative_offset_wraps_back_across_midnight() {
        let late = MIDNIGHT + 23 * 3_600 + 30 * 60;
        assert_eq!(format_hh_mm(late, 0).as_deref(), Some("23:30"));
        assert_eq!(format_hh_mm(late, -18_000).as_deref(), Some("18:30"));

        // 02:00 UTC shifted back five hours lands on the previous evening.
        let early = MIDNIGHT + 2 * 3_600;
        assert_eq!(format_hh_mm(early, -18_000).as_deref(), Some("21:00"));
    }

    #[test]
    fn positive_offset_wraps_forward_across_midnight() {
        let t = MIDNIGHT + 22 * 3_600;
        assert_eq!(format_hh_mm(t, 5 * 3_600 + 1_800).as_deref(), Some("03:30"));
    }

    #[test]
    fn shifting_timestamp_and_offset_oppositely_is_invisible() {
        for offset in [-43_200, -18_000, -10_800, 0, 19_800, 50_400] {
            for k in [-100_000_i64, -86_400, -1, 0, 1, 3_599, 86_400, 1_000_000] {
                assert_eq!(
                    format_hh_mm(T, offset),
                    format_hh_mm(T + k, offset - k),
                    "offset={offset} k={k}"
                );
            }
        }
    }

    #[test]
    fn out_of_range_instant_is_none() {
        assert_eq!(format_hh_mm(i64::MAX, 1), None);
        assert_eq!(format_hh_mm(i64::MAX / 2, 0), None);
    }

    #[test]
    fn clock_string_has_seconds() {
        let now = DateTime::<Utc>::from_timestamp(T, 0).unwrap();
        assert_eq!(format_hh_mm_ss(now, 0).as_deref(), Some("22:13:20"));
        assert_eq!(format_hh_mm_ss(now, -10_800).as_deref(), Some("19:13:20"));
        assert_eq!(format_hh_mm_ss(now, 7_200).as_deref(), Some("00:13:20"));
    }

    #[test]
    fn clock_string_for_huge_offset_is_none() {
        let now = DateTime::<Utc>::from_timestamp(T, 0).unwrap();
        assert_eq!(format_hh_mm_ss(now, 10_000_000_000_000), None);
        assert_eq!(format_hh_mm_ss(now, i64::MIN), None);
    }
}
