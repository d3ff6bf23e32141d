// Error taxonomy for reconstruction and scheduling.
// Data-quality gaps (missing rate, conversion, domain) never surface here; see conversions::Resolution.

use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("start time {start} exceeds stop time {stop}")]
    InvalidTimeRange {
        start: NaiveDateTime,
        stop: NaiveDateTime,
    },

    #[error("encountered unknown counter type {0:?}")]
    UnknownCounterType(String),

    #[error("unparseable sample timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// The window cannot be split further and still holds more samples than one query may return.
    #[error("window {start} - {stop} holds {count} samples (max {max}) and cannot be split further")]
    WindowTooDense {
        start: NaiveDateTime,
        stop: NaiveDateTime,
        count: u64,
        max: u64,
    },

    #[error("telemetry backend: {0}")]
    Backend(#[from] anyhow::Error),
}
