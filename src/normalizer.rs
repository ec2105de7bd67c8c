//! Interval normalization
//!
//! Canonicalizes raw sleep input into a `SleepRecord`. Two input shapes are
//! accepted as distinct entry points with different overnight policies:
//! - an explicit `start/end` date-time interval, which rejects a wake that is
//!   not strictly after the bed timestamp
//! - a bare bed/wake clock-time pair, which infers a next-day wake
//!
//! In both shapes the record's `sleep_date` is the submission date supplied
//! by the caller, never derived from the interval itself.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::SleepError;
use crate::timeutil::wall_clock_span;
use crate::types::{IntervalRequest, SleepRecord, TimePairRequest};

/// Normalizer for converting raw input into canonical sleep records
pub struct Normalizer;

impl Normalizer {
    /// Normalize an explicit `start/end` date-time interval.
    ///
    /// The caller supplies both dates, so no overnight inference is applied:
    /// an end that is not strictly after the start is rejected.
    pub fn from_interval(
        request: &IntervalRequest,
        user_id: &str,
        submitted_on: NaiveDate,
    ) -> Result<SleepRecord, SleepError> {
        let (bed, wake) = parse_interval(&request.time_in_bed_interval)?;

        if wake <= bed {
            return Err(SleepError::WakeNotAfterBed);
        }

        Ok(SleepRecord {
            user_id: user_id.to_string(),
            sleep_date: submitted_on,
            bed_time: bed.time(),
            wake_time: wake.time(),
            total_time_in_bed: wake - bed,
            mood_label: request.mood_label,
        })
    }

    /// Normalize a bare bed/wake clock-time pair.
    ///
    /// If the wake time is strictly after the bed time the session stays
    /// within one notional day; otherwise the wake is assumed to fall on the
    /// following day and the duration is the time remaining until midnight
    /// plus the time elapsed after it.
    pub fn from_time_pair(
        request: &TimePairRequest,
        user_id: &str,
        submitted_on: NaiveDate,
    ) -> Result<SleepRecord, SleepError> {
        let bed = parse_clock_time(&request.bed_time)?;
        let wake = parse_clock_time(&request.wake_time)?;

        Ok(SleepRecord {
            user_id: user_id.to_string(),
            sleep_date: submitted_on,
            bed_time: bed,
            wake_time: wake,
            total_time_in_bed: wall_clock_span(bed, wake),
            mood_label: request.mood_label,
        })
    }
}

/// Split an ISO 8601 `start/end` interval into its two date-times
fn parse_interval(interval: &str) -> Result<(NaiveDateTime, NaiveDateTime), SleepError> {
    let parts: Vec<&str> = interval.split('/').collect();
    if parts.len() != 2 {
        return Err(SleepError::InvalidInterval(interval.to_string()));
    }

    let bed = parse_datetime(parts[0])?;
    let wake = parse_datetime(parts[1])?;
    Ok((bed, wake))
}

fn parse_datetime(value: &str) -> Result<NaiveDateTime, SleepError> {
    value
        .parse::<NaiveDateTime>()
        .map_err(|e| SleepError::DateTimeParse(format!("{}: {}", value, e)))
}

/// Parse a bare clock time, with or without seconds
fn parse_clock_time(value: &str) -> Result<NaiveTime, SleepError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|e| SleepError::TimeParse(format!("{}: {}", value, e)))
}
