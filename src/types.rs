//! Core types for the Somnus engine
//!
//! Defines the stored record, the derived summary, and the two raw request
//! shapes accepted at the boundary. All JSON field names are camelCase, the
//! convention of the surrounding API layer.

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::timeutil::{format_duration, wall_clock_span};

/// Morning feeling reported with each night. The enumeration is closed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum MoodLabel {
    Bad,
    Ok,
    Good,
}

impl MoodLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoodLabel::Bad => "BAD",
            MoodLabel::Ok => "OK",
            MoodLabel::Good => "GOOD",
        }
    }
}

/// One canonical night of sleep. Immutable once constructed.
///
/// `total_time_in_bed` is always the wall-clock span from `bed_time` to
/// `wake_time`, with wake on the same or the following calendar day,
/// whichever keeps the span non-negative and minimal. It is serialized as
/// whole minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepRecord {
    /// Opaque identifier owned by the external store, not validated here
    pub user_id: String,
    /// Date attributed to the session: the day the user woke up and submitted
    pub sleep_date: NaiveDate,
    pub bed_time: NaiveTime,
    pub wake_time: NaiveTime,
    #[serde(with = "crate::timeutil::duration_minutes")]
    pub total_time_in_bed: Duration,
    pub mood_label: MoodLabel,
}

impl SleepRecord {
    /// Whether the stored duration matches the bed-to-wake wall-clock span.
    ///
    /// Holds by construction for every record the normalizer produces from a
    /// session shorter than one day.
    pub fn is_consistent(&self) -> bool {
        self.total_time_in_bed == wall_clock_span(self.bed_time, self.wake_time)
    }
}

/// Presentation view of a record with the duration formatted as "Xh Ym"
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepRecordSummary {
    pub sleep_date: NaiveDate,
    pub bed_time: NaiveTime,
    pub wake_time: NaiveTime,
    pub total_time_in_bed: String,
    pub mood_label: MoodLabel,
}

impl From<&SleepRecord> for SleepRecordSummary {
    fn from(record: &SleepRecord) -> Self {
        Self {
            sleep_date: record.sleep_date,
            bed_time: record.bed_time,
            wake_time: record.wake_time,
            total_time_in_bed: format_duration(record.total_time_in_bed),
            mood_label: record.mood_label,
        }
    }
}

/// Aggregate summary over a date-ascending batch of records.
///
/// Derived per request, never persisted. Mood labels with a zero count are
/// omitted from `mood_frequencies`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepAverages {
    /// First contributing record's sleep date
    pub date_range_start: NaiveDate,
    /// Last contributing record's sleep date
    pub date_range_end: NaiveDate,
    /// Mean time in bed, truncated to whole minutes, formatted "Xh Ym"
    pub average_total_time_in_bed: String,
    /// Circular average; see the aggregator for the midnight-wrap rule
    pub average_bed_time: NaiveTime,
    /// Plain arithmetic average
    pub average_wake_time: NaiveTime,
    pub mood_frequencies: BTreeMap<MoodLabel, u32>,
}

/// Raw input carrying a single ISO 8601 interval for the sleep period.
///
/// Example:
/// ```json
/// {
///   "timeInBedInterval": "2026-02-25T23:30:00/2026-02-26T07:00:00",
///   "moodLabel": "GOOD"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalRequest {
    /// ISO 8601 interval: "startDateTime/endDateTime"
    pub time_in_bed_interval: String,
    pub mood_label: MoodLabel,
}

/// Raw input carrying bare bed and wake clock times, no dates.
///
/// Example:
/// ```json
/// {
///   "bedTime": "23:30",
///   "wakeTime": "07:00",
///   "moodLabel": "OK"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePairRequest {
    /// Clock time "HH:MM" or "HH:MM:SS"
    pub bed_time: String,
    /// Clock time "HH:MM" or "HH:MM:SS"; may be on the following day
    pub wake_time: String,
    pub mood_label: MoodLabel,
}
