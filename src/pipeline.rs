//! Pipeline orchestration
//!
//! Public facade tying the normalizer and the aggregator together the way the
//! surrounding service layer calls them: log one night, derive the last-N-days
//! window, and summarize an already-fetched batch of stored records.

use chrono::{Duration, NaiveDate};
use tracing::info;

use crate::aggregator::{AggregateMode, Aggregator};
use crate::error::SleepError;
use crate::normalizer::Normalizer;
use crate::types::{IntervalRequest, SleepAverages, SleepRecord, TimePairRequest};

/// Default aggregation window in days
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Stateless processor wiring the engine's entry points together.
///
/// Holds only configuration (aggregation strategy and window size); inputs
/// are immutable and outputs freshly constructed, so a single processor is
/// safe to share across threads.
#[derive(Debug, Clone)]
pub struct SleepProcessor {
    aggregator: Aggregator,
    window_days: u32,
}

impl Default for SleepProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl SleepProcessor {
    /// Create a processor with the in-process aggregation strategy
    pub fn new() -> Self {
        Self::with_mode(AggregateMode::InProcess)
    }

    /// Create a processor with a specific aggregation strategy
    pub fn with_mode(mode: AggregateMode) -> Self {
        Self {
            aggregator: Aggregator::new(mode),
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    /// Override the aggregation window length
    pub fn with_window_days(mut self, window_days: u32) -> Self {
        self.window_days = window_days;
        self
    }

    /// Normalize one night from an explicit `start/end` date-time interval
    pub fn log_interval(
        &self,
        request: &IntervalRequest,
        user_id: &str,
        submitted_on: NaiveDate,
    ) -> Result<SleepRecord, SleepError> {
        info!(user_id, date = %submitted_on, "creating sleep record from interval");
        Normalizer::from_interval(request, user_id, submitted_on)
    }

    /// Normalize one night from a bare bed/wake clock-time pair
    pub fn log_time_pair(
        &self,
        request: &TimePairRequest,
        user_id: &str,
        submitted_on: NaiveDate,
    ) -> Result<SleepRecord, SleepError> {
        info!(user_id, date = %submitted_on, "creating sleep record from time pair");
        Normalizer::from_time_pair(request, user_id, submitted_on)
    }

    /// Inclusive date window ending today: `[today - (window_days - 1), today]`
    pub fn window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (today - Duration::days(self.window_days as i64 - 1), today)
    }

    /// Summarize an already-fetched, date-ascending batch of records.
    ///
    /// An empty batch is an absence signal, not an error: the store found
    /// nothing in the window.
    pub fn averages(&self, records: &[SleepRecord]) -> Result<Option<SleepAverages>, SleepError> {
        if records.is_empty() {
            info!("no sleep records in window");
            return Ok(None);
        }

        info!(count = records.len(), "aggregating sleep records");
        self.aggregator.aggregate(records).map(Some)
    }

    /// Record attributed to today's wake-up, if one exists
    pub fn last_night<'a>(
        &self,
        records: &'a [SleepRecord],
        today: NaiveDate,
    ) -> Option<&'a SleepRecord> {
        records.iter().find(|r| r.sleep_date == today)
    }
}

/// Parse stored records from newline-delimited JSON, skipping blank lines
pub fn records_from_ndjson(data: &str) -> Result<Vec<SleepRecord>, SleepError> {
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str(line).map_err(SleepError::from))
        .collect()
}

/// Parse stored records from a JSON array
pub fn records_from_array(data: &str) -> Result<Vec<SleepRecord>, SleepError> {
    serde_json::from_str(data).map_err(SleepError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MoodLabel;
    use chrono::NaiveTime;
    use pretty_assertions::assert_eq;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn make_record(date: NaiveDate) -> SleepRecord {
        SleepRecord {
            user_id: "1".to_string(),
            sleep_date: date,
            bed_time: NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
            wake_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            total_time_in_bed: Duration::hours(8),
            mood_label: MoodLabel::Good,
        }
    }

    #[test]
    fn test_window_is_inclusive_last_n_days() {
        let processor = SleepProcessor::new();
        let (start, end) = processor.window(d(30));

        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(end, d(30));
    }

    #[test]
    fn test_window_respects_override() {
        let processor = SleepProcessor::new().with_window_days(7);
        let (start, end) = processor.window(d(10));

        assert_eq!(start, d(4));
        assert_eq!(end, d(10));
    }

    #[test]
    fn test_averages_absent_for_empty_batch() {
        let processor = SleepProcessor::new();
        assert_eq!(processor.averages(&[]).unwrap(), None);
    }

    #[test]
    fn test_averages_present_for_records() {
        let processor = SleepProcessor::new();
        let records = vec![make_record(d(1)), make_record(d(2))];

        let averages = processor.averages(&records).unwrap().unwrap();
        assert_eq!(averages.date_range_start, d(1));
        assert_eq!(averages.date_range_end, d(2));
        assert_eq!(averages.average_total_time_in_bed, "8h 0m");
    }

    #[test]
    fn test_last_night_lookup() {
        let processor = SleepProcessor::new();
        let records = vec![make_record(d(1)), make_record(d(2))];

        assert_eq!(processor.last_night(&records, d(2)), Some(&records[1]));
        assert_eq!(processor.last_night(&records, d(3)), None);
    }

    #[test]
    fn test_log_entry_points_delegate_to_normalizer() {
        let processor = SleepProcessor::new();

        let interval = IntervalRequest {
            time_in_bed_interval: "2026-03-01T23:30:00/2026-03-02T07:00:00".to_string(),
            mood_label: MoodLabel::Good,
        };
        let record = processor.log_interval(&interval, "1", d(2)).unwrap();
        assert_eq!(record.total_time_in_bed, Duration::minutes(450));

        let pair = TimePairRequest {
            bed_time: "23:00".to_string(),
            wake_time: "07:00".to_string(),
            mood_label: MoodLabel::Ok,
        };
        let record = processor.log_time_pair(&pair, "1", d(2)).unwrap();
        assert_eq!(record.total_time_in_bed, Duration::hours(8));
    }

    #[test]
    fn test_records_from_ndjson() {
        let data = concat!(
            r#"{"userId":"1","sleepDate":"2026-03-01","bedTime":"23:00:00","wakeTime":"07:00:00","totalTimeInBed":480,"moodLabel":"GOOD"}"#,
            "\n\n",
            r#"{"userId":"1","sleepDate":"2026-03-02","bedTime":"22:30:00","wakeTime":"06:30:00","totalTimeInBed":480,"moodLabel":"OK"}"#,
            "\n",
        );

        let records = records_from_ndjson(data).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sleep_date, d(1));
        assert_eq!(records[1].mood_label, MoodLabel::Ok);
    }

    #[test]
    fn test_records_from_ndjson_rejects_bad_line() {
        let err = records_from_ndjson("not json\n").unwrap_err();
        assert!(matches!(err, SleepError::Json(_)));
    }

    #[test]
    fn test_records_from_array() {
        let data = r#"[{"userId":"1","sleepDate":"2026-03-01","bedTime":"23:00:00","wakeTime":"07:00:00","totalTimeInBed":480,"moodLabel":"BAD"}]"#;
        let records = records_from_array(data).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mood_label, MoodLabel::Bad);
    }
}
