//! Somnus - compute engine for sleep diary records and aggregate statistics
//!
//! Somnus canonicalizes one night's raw sleep input into an immutable
//! `SleepRecord` and computes summary statistics over a date-ascending batch
//! of stored records: average duration, circular average of bed time,
//! arithmetic average of wake time, and a mood histogram.
//!
//! ## Modules
//!
//! - **Normalizer**: canonicalize raw interval or time-pair input into records
//! - **Aggregator**: last-N-days summary with two interchangeable strategies
//! - **Seeder**: idempotent backfill for local development
//!
//! Persistence and HTTP routing are external collaborators: the engine only
//! consumes already-fetched record batches and produces freshly constructed
//! values, so every entry point is safe to call concurrently.

pub mod aggregator;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod seeder;
pub mod timeutil;
pub mod types;

pub use aggregator::{AggregateMode, Aggregator};
pub use error::SleepError;
pub use normalizer::Normalizer;
pub use pipeline::{records_from_array, records_from_ndjson, SleepProcessor, DEFAULT_WINDOW_DAYS};
pub use seeder::{SeedPlan, Seeder, DEFAULT_SEED_DAYS};
pub use types::{
    IntervalRequest, MoodLabel, SleepAverages, SleepRecord, SleepRecordSummary, TimePairRequest,
};

/// Engine version reported by the CLI
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
