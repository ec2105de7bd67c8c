//! Startup backfill
//!
//! Idempotent seeding collaborator for local development: given the store's
//! current state (record count and latest sleep date), decide how many days
//! of history to fabricate, ending yesterday, and generate plausible records.
//! This lives outside the aggregation core; the caller persists the output.

use chrono::{Duration, NaiveDate, NaiveTime};
use rand::Rng;
use tracing::info;

use crate::types::{MoodLabel, SleepRecord};

/// Default number of days to backfill
pub const DEFAULT_SEED_DAYS: u32 = 30;

/// A resolved backfill: `days` consecutive records ending on `end_date`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedPlan {
    pub days: u32,
    pub end_date: NaiveDate,
}

/// Backfill planner and generator
#[derive(Debug, Clone, Copy)]
pub struct Seeder {
    seed_days: u32,
}

impl Default for Seeder {
    fn default() -> Self {
        Self::new(DEFAULT_SEED_DAYS)
    }
}

impl Seeder {
    pub fn new(seed_days: u32) -> Self {
        Self { seed_days }
    }

    /// Decide whether a backfill is needed.
    ///
    /// Seeding always ends yesterday; today's record belongs to the user. An
    /// empty store gets the full window, a stale store only the gap since its
    /// latest date, and an up-to-date store nothing, so repeated startups are
    /// idempotent.
    pub fn plan(
        &self,
        existing_count: u64,
        latest_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Option<SeedPlan> {
        let yesterday = today - Duration::days(1);

        if existing_count == 0 {
            info!(days = self.seed_days, "no sleep data found, seeding");
            return Some(SeedPlan {
                days: self.seed_days,
                end_date: yesterday,
            });
        }

        let latest = match latest_date {
            Some(date) if date >= yesterday => {
                info!(
                    count = existing_count,
                    latest = %date,
                    "sleep data is up to date, skipping seed"
                );
                return None;
            }
            Some(date) => date,
            None => {
                info!(days = self.seed_days, "no latest date recorded, seeding");
                return Some(SeedPlan {
                    days: self.seed_days,
                    end_date: yesterday,
                });
            }
        };

        let gap_days = (yesterday - latest).num_days();
        if gap_days > self.seed_days as i64 {
            info!(
                gap_days,
                days = self.seed_days,
                "gap since last seed exceeds window, reseeding"
            );
            Some(SeedPlan {
                days: self.seed_days,
                end_date: yesterday,
            })
        } else {
            // latest < yesterday here, so the gap is at least one day
            info!(gap_days, latest = %latest, "filling gap since last seeded date");
            Some(SeedPlan {
                days: gap_days as u32,
                end_date: yesterday,
            })
        }
    }

    /// Generate records for a plan using thread-local randomness
    pub fn generate(&self, plan: &SeedPlan, user_id: &str) -> Vec<SleepRecord> {
        self.generate_with(&mut rand::thread_rng(), plan, user_id)
    }

    /// Generate records for a plan with a caller-supplied RNG
    pub fn generate_with<R: Rng>(
        &self,
        rng: &mut R,
        plan: &SeedPlan,
        user_id: &str,
    ) -> Vec<SleepRecord> {
        info!(days = plan.days, end_date = %plan.end_date, "generating seed records");

        (0..plan.days)
            .rev()
            .map(|days_ago| {
                let date = plan.end_date - Duration::days(days_ago as i64);
                generate_record(rng, user_id, date)
            })
            .collect()
    }
}

fn generate_record<R: Rng>(rng: &mut R, user_id: &str, sleep_date: NaiveDate) -> SleepRecord {
    let bed_time = random_bed_time(rng);
    let total_time_in_bed = random_sleep_duration(rng);
    let wake_time = bed_time.overflowing_add_signed(total_time_in_bed).0;

    SleepRecord {
        user_id: user_id.to_string(),
        sleep_date,
        bed_time,
        wake_time,
        total_time_in_bed,
        mood_label: random_mood(rng),
    }
}

/// Bed time in the late-evening band, or just after midnight
fn random_bed_time<R: Rng>(rng: &mut R) -> NaiveTime {
    let hour: u32 = if rng.gen_bool(0.5) {
        rng.gen_range(21..24)
    } else {
        0
    };
    let minute: u32 = rng.gen_range(0..60);
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Between five and ten hours in bed
fn random_sleep_duration<R: Rng>(rng: &mut R) -> Duration {
    Duration::hours(rng.gen_range(5..10)) + Duration::minutes(rng.gen_range(0..60))
}

fn random_mood<R: Rng>(rng: &mut R) -> MoodLabel {
    match rng.gen_range(0..100) {
        0..=25 => MoodLabel::Bad,
        26..=65 => MoodLabel::Ok,
        _ => MoodLabel::Good,
    }
}
