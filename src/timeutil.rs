//! Clock-time and duration helpers
//!
//! Sleep sessions routinely cross midnight, so clock arithmetic works in
//! whole minutes since midnight with explicit wraparound rules shared by the
//! normalizer and the aggregator.

use chrono::{Duration, NaiveTime, Timelike};

/// Minutes in one day
pub const DAY_MINUTES: i64 = 24 * 60;

/// Evening threshold for circular bed-time averaging (18:00)
pub const EVENING_THRESHOLD_MINUTES: i64 = 18 * 60;

/// Whole minutes since midnight, seconds dropped
pub fn minutes_since_midnight(time: NaiveTime) -> i64 {
    (time.hour() as i64) * 60 + time.minute() as i64
}

/// Convert minutes back to a clock time, reducing modulo one day
pub fn time_from_minutes(minutes: i64) -> NaiveTime {
    let reduced = minutes.rem_euclid(DAY_MINUTES);
    NaiveTime::from_hms_opt((reduced / 60) as u32, (reduced % 60) as u32, 0)
        .unwrap_or(NaiveTime::MIN)
}

/// Wall-clock span from bed time to wake time.
///
/// A wake time that is not strictly after the bed time is taken to occur on
/// the following day, so equal times yield a full 24 hours.
pub fn wall_clock_span(bed: NaiveTime, wake: NaiveTime) -> Duration {
    let span = wake.signed_duration_since(bed);
    if span > Duration::zero() {
        span
    } else {
        span + Duration::days(1)
    }
}

/// Format a duration as "Xh Ym", whole minutes
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes();
    format!("{}h {}m", total_minutes / 60, total_minutes % 60)
}

/// Serde adapter storing durations as whole minutes
pub mod duration_minutes {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.num_minutes().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let minutes = i64::deserialize(deserializer)?;
        Ok(Duration::minutes(minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn t(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_minutes_since_midnight_drops_seconds() {
        let time = NaiveTime::from_hms_opt(23, 30, 45).unwrap();
        assert_eq!(minutes_since_midnight(time), 23 * 60 + 30);
    }

    #[test]
    fn test_time_from_minutes_reduces_modulo_day() {
        assert_eq!(time_from_minutes(1440), t(0, 0));
        assert_eq!(time_from_minutes(1380), t(23, 0));
        assert_eq!(time_from_minutes(1500), t(1, 0));
    }

    #[test]
    fn test_wall_clock_span_same_day() {
        assert_eq!(wall_clock_span(t(6, 0), t(8, 30)), Duration::minutes(150));
    }

    #[test]
    fn test_wall_clock_span_across_midnight() {
        // bed 23:00, wake 07:00 is exactly 8 hours
        assert_eq!(wall_clock_span(t(23, 0), t(7, 0)), Duration::hours(8));
    }

    #[test]
    fn test_wall_clock_span_equal_times_is_full_day() {
        assert_eq!(wall_clock_span(t(22, 0), t(22, 0)), Duration::days(1));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::minutes(480)), "8h 0m");
        assert_eq!(format_duration(Duration::minutes(451)), "7h 31m");
        assert_eq!(format_duration(Duration::zero()), "0h 0m");
    }

    #[test]
    fn test_duration_minutes_serde() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Wrapper {
            #[serde(with = "duration_minutes")]
            value: Duration,
        }

        let json = serde_json::to_string(&Wrapper {
            value: Duration::minutes(450),
        })
        .unwrap();
        assert_eq!(json, r#"{"value":450}"#);

        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value, Duration::minutes(450));
    }
}
