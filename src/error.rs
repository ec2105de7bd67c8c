//! Error types for Somnus

use thiserror::Error;

/// Errors that can occur during normalization or aggregation.
///
/// All failures are deterministic functions of the input and are never
/// retried.
#[derive(Debug, Error)]
pub enum SleepError {
    #[error("Invalid interval format, expected startDateTime/endDateTime: {0}")]
    InvalidInterval(String),

    #[error("Failed to parse date-time: {0}")]
    DateTimeParse(String),

    #[error("Failed to parse clock time: {0}")]
    TimeParse(String),

    #[error("Wake time must be after bed time")]
    WakeNotAfterBed,

    #[error("Cannot calculate averages from an empty record set")]
    EmptyInput,

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl SleepError {
    /// True for malformed-input failures that map to a user-facing 4xx
    /// response in the surrounding API layer.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SleepError::InvalidInterval(_)
                | SleepError::DateTimeParse(_)
                | SleepError::TimeParse(_)
                | SleepError::WakeNotAfterBed
        )
    }
}
