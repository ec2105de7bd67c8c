//! Aggregate statistics
//!
//! Computes the summary over a date-ascending batch of records: average
//! duration, circular average of bed time, arithmetic average of wake time,
//! and the mood histogram.
//!
//! Two interchangeable strategies share the arithmetic. `InProcess` iterates
//! the records directly; `Projection` accumulates the sums, counts, and
//! min/max a query engine's aggregate row would return, then converts them
//! with the same floor-division and modulo rules. Callers must not be able to
//! tell the two apart.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::error::SleepError;
use crate::timeutil::{
    format_duration, minutes_since_midnight, time_from_minutes, DAY_MINUTES,
    EVENING_THRESHOLD_MINUTES,
};
use crate::types::{MoodLabel, SleepAverages, SleepRecord};

/// Strategy for computing the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregateMode {
    /// Iterate the records directly
    #[default]
    InProcess,
    /// Accumulate engine-style sums and counts, then convert
    Projection,
}

/// Aggregator over an already-fetched snapshot of records
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    mode: AggregateMode,
}

impl Aggregator {
    pub fn new(mode: AggregateMode) -> Self {
        Self { mode }
    }

    /// Aggregate a non-empty, date-ascending batch of records.
    ///
    /// Ordering is the caller's contract: the date range is read from the
    /// first and last record without sorting. An empty batch fails with
    /// `EmptyInput`; callers that want an absence signal check emptiness
    /// before calling.
    pub fn aggregate(&self, records: &[SleepRecord]) -> Result<SleepAverages, SleepError> {
        if records.is_empty() {
            return Err(SleepError::EmptyInput);
        }

        Ok(match self.mode {
            AggregateMode::InProcess => aggregate_in_process(records),
            AggregateMode::Projection => AveragesProjection::scan(records).into_averages(),
        })
    }
}

fn aggregate_in_process(records: &[SleepRecord]) -> SleepAverages {
    SleepAverages {
        date_range_start: records[0].sleep_date,
        date_range_end: records[records.len() - 1].sleep_date,
        average_total_time_in_bed: format_duration(average_duration(records)),
        average_bed_time: average_bed_time(records),
        average_wake_time: average_wake_time(records),
        mood_frequencies: mood_frequencies(records),
    }
}

/// Mean time in bed; partial minutes are dropped, not rounded
fn average_duration(records: &[SleepRecord]) -> Duration {
    let total_minutes: i64 = records
        .iter()
        .map(|r| r.total_time_in_bed.num_minutes())
        .sum();
    Duration::minutes(total_minutes / records.len() as i64)
}

/// Circular bed-time average.
///
/// Bed times cluster in the evening/early-morning band. Minutes before the
/// 18:00 threshold are shifted by one full day before averaging so that e.g.
/// [23:00, 01:00] becomes [1380, 1500] and averages to 00:00 rather than
/// collapsing toward noon. The result is reduced modulo one day.
fn average_bed_time(records: &[SleepRecord]) -> NaiveTime {
    let adjusted_sum: i64 = records
        .iter()
        .map(|r| {
            let minutes = minutes_since_midnight(r.bed_time);
            if minutes < EVENING_THRESHOLD_MINUTES {
                minutes + DAY_MINUTES
            } else {
                minutes
            }
        })
        .sum();

    time_from_minutes(adjusted_sum / records.len() as i64)
}

/// Plain arithmetic wake-time average.
///
/// Wake times cluster in the morning and never need wraparound correction.
fn average_wake_time(records: &[SleepRecord]) -> NaiveTime {
    let total: i64 = records
        .iter()
        .map(|r| minutes_since_midnight(r.wake_time))
        .sum();
    time_from_minutes(total / records.len() as i64)
}

fn mood_frequencies(records: &[SleepRecord]) -> BTreeMap<MoodLabel, u32> {
    let mut frequencies = BTreeMap::new();
    for record in records {
        *frequencies.entry(record.mood_label).or_insert(0) += 1;
    }
    frequencies
}

/// Sums and counts in the shape a query engine's aggregate row would return
#[derive(Debug, Clone, Default)]
struct AveragesProjection {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    row_count: i64,
    total_minutes_sum: i64,
    adjusted_bed_minutes_sum: i64,
    wake_minutes_sum: i64,
    bad_count: u32,
    ok_count: u32,
    good_count: u32,
}

impl AveragesProjection {
    /// Single pass accumulating what `MIN`/`MAX`/`SUM`/filtered-`COUNT`
    /// aggregates would produce, including the same +1440 shift for bed
    /// times before 18:00
    fn scan(records: &[SleepRecord]) -> Self {
        let mut projection = Self::default();

        for record in records {
            projection.row_count += 1;
            projection.start_date = Some(
                projection
                    .start_date
                    .map_or(record.sleep_date, |d| d.min(record.sleep_date)),
            );
            projection.end_date = Some(
                projection
                    .end_date
                    .map_or(record.sleep_date, |d| d.max(record.sleep_date)),
            );

            projection.total_minutes_sum += record.total_time_in_bed.num_minutes();

            let bed_minutes = minutes_since_midnight(record.bed_time);
            projection.adjusted_bed_minutes_sum += if bed_minutes < EVENING_THRESHOLD_MINUTES {
                bed_minutes + DAY_MINUTES
            } else {
                bed_minutes
            };

            projection.wake_minutes_sum += minutes_since_midnight(record.wake_time);

            match record.mood_label {
                MoodLabel::Bad => projection.bad_count += 1,
                MoodLabel::Ok => projection.ok_count += 1,
                MoodLabel::Good => projection.good_count += 1,
            }
        }

        projection
    }

    /// Convert the accumulated row with the same floor/modulo rules as the
    /// in-process path
    fn into_averages(self) -> SleepAverages {
        // aggregate() rejects empty input before scanning
        let count = self.row_count.max(1);

        let mut mood_frequencies = BTreeMap::new();
        for (label, frequency) in [
            (MoodLabel::Bad, self.bad_count),
            (MoodLabel::Ok, self.ok_count),
            (MoodLabel::Good, self.good_count),
        ] {
            if frequency > 0 {
                mood_frequencies.insert(label, frequency);
            }
        }

        SleepAverages {
            date_range_start: self.start_date.unwrap_or_default(),
            date_range_end: self.end_date.unwrap_or_default(),
            average_total_time_in_bed: format_duration(Duration::minutes(
                self.total_minutes_sum / count,
            )),
            average_bed_time: time_from_minutes(self.adjusted_bed_minutes_sum / count),
            average_wake_time: time_from_minutes(self.wake_minutes_sum / count),
            mood_frequencies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeutil::wall_clock_span;
    use pretty_assertions::assert_eq;

    fn t(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn make_record(date: NaiveDate, bed: NaiveTime, wake: NaiveTime, mood: MoodLabel) -> SleepRecord {
        SleepRecord {
            user_id: "1".to_string(),
            sleep_date: date,
            bed_time: bed,
            wake_time: wake,
            total_time_in_bed: wall_clock_span(bed, wake),
            mood_label: mood,
        }
    }

    /// Three nights over two days: 8h0m, 8h1m, 8h1m in bed
    fn make_fixture() -> Vec<SleepRecord> {
        vec![
            make_record(d(1), t(23, 0), t(7, 0), MoodLabel::Good),
            make_record(d(2), t(22, 59), t(7, 0), MoodLabel::Good),
            make_record(d(2), t(23, 0), t(7, 1), MoodLabel::Ok),
        ]
    }

    #[test]
    fn test_empty_input_fails() {
        let err = Aggregator::default().aggregate(&[]).unwrap_err();
        assert!(matches!(err, SleepError::EmptyInput));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_circular_bed_time_average_straddling_midnight() {
        let records = vec![
            make_record(d(1), t(23, 0), t(7, 0), MoodLabel::Ok),
            make_record(d(2), t(1, 0), t(9, 0), MoodLabel::Ok),
        ];

        let averages = Aggregator::default().aggregate(&records).unwrap();
        // mean of 23:00 and 01:00 is midnight, not noon
        assert_eq!(averages.average_bed_time, t(0, 0));
    }

    #[test]
    fn test_circular_bed_time_average_evening_band() {
        let records = vec![
            make_record(d(1), t(22, 0), t(6, 0), MoodLabel::Ok),
            make_record(d(2), t(23, 0), t(6, 0), MoodLabel::Ok),
            make_record(d(3), t(0, 0), t(6, 0), MoodLabel::Ok),
        ];

        let averages = Aggregator::default().aggregate(&records).unwrap();
        assert_eq!(averages.average_bed_time, t(23, 0));
    }

    #[test]
    fn test_wake_time_average() {
        let records = vec![
            make_record(d(1), t(23, 0), t(6, 0), MoodLabel::Ok),
            make_record(d(2), t(23, 0), t(8, 0), MoodLabel::Ok),
        ];

        let averages = Aggregator::default().aggregate(&records).unwrap();
        assert_eq!(averages.average_wake_time, t(7, 0));
    }

    #[test]
    fn test_duration_average_floors_partial_minutes() {
        // (480 + 481 + 481) / 3 = 480 with the remainder dropped
        let averages = Aggregator::default().aggregate(&make_fixture()).unwrap();
        assert_eq!(averages.average_total_time_in_bed, "8h 0m");
    }

    #[test]
    fn test_mood_histogram_omits_zero_counts() {
        let averages = Aggregator::default().aggregate(&make_fixture()).unwrap();

        let mut expected = BTreeMap::new();
        expected.insert(MoodLabel::Ok, 1);
        expected.insert(MoodLabel::Good, 2);
        assert_eq!(averages.mood_frequencies, expected);
        assert!(!averages.mood_frequencies.contains_key(&MoodLabel::Bad));
    }

    #[test]
    fn test_date_range_from_first_and_last_record() {
        let averages = Aggregator::default().aggregate(&make_fixture()).unwrap();
        assert_eq!(averages.date_range_start, d(1));
        assert_eq!(averages.date_range_end, d(2));
    }

    #[test]
    fn test_strategies_agree_on_fixture() {
        let records = make_fixture();

        let in_process = Aggregator::new(AggregateMode::InProcess)
            .aggregate(&records)
            .unwrap();
        let projection = Aggregator::new(AggregateMode::Projection)
            .aggregate(&records)
            .unwrap();

        assert_eq!(in_process, projection);
    }

    #[test]
    fn test_strategies_agree_across_midnight_and_moods() {
        let records = vec![
            make_record(d(1), t(21, 12), t(5, 45), MoodLabel::Bad),
            make_record(d(2), t(23, 59), t(7, 1), MoodLabel::Ok),
            make_record(d(3), t(0, 30), t(8, 15), MoodLabel::Good),
            make_record(d(4), t(1, 0), t(9, 0), MoodLabel::Good),
            make_record(d(5), t(22, 5), t(6, 40), MoodLabel::Ok),
        ];

        let in_process = Aggregator::new(AggregateMode::InProcess)
            .aggregate(&records)
            .unwrap();
        let projection = Aggregator::new(AggregateMode::Projection)
            .aggregate(&records)
            .unwrap();

        assert_eq!(in_process, projection);
    }

    #[test]
    fn test_projection_mode_fails_on_empty_input() {
        let err = Aggregator::new(AggregateMode::Projection)
            .aggregate(&[])
            .unwrap_err();
        assert!(matches!(err, SleepError::EmptyInput));
    }

    #[test]
    fn test_single_record_averages() {
        let records = vec![make_record(d(1), t(23, 30), t(7, 0), MoodLabel::Good)];
        let averages = Aggregator::default().aggregate(&records).unwrap();

        assert_eq!(averages.average_total_time_in_bed, "7h 30m");
        assert_eq!(averages.average_bed_time, t(23, 30));
        assert_eq!(averages.average_wake_time, t(7, 0));
        assert_eq!(averages.date_range_start, averages.date_range_end);
    }
}
