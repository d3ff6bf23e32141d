// Domain models: telemetry samples, windows, query filters and schedules.

use std::collections::HashMap;

mod query;
mod sample;
mod schedule;
mod window;

pub use query::{FilterOp, QueryFilter, time_filters, with_time_filters};
pub use sample::{CounterType, DELETED_STATES, LIFECYCLE_KEYS, Metadata, Sample};
pub use schedule::ScheduleEntry;
pub use window::TimeWindow;

/// One row of a billing export, keyed by column name.
pub type Row = HashMap<String, String>;
