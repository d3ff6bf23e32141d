// Billing / query windows. Query windows are half-open: (start, stop].

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::UsageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
}

impl TimeWindow {
    /// Fails with `InvalidTimeRange` when `start > stop`.
    pub fn new(start: NaiveDateTime, stop: NaiveDateTime) -> Result<Self, UsageError> {
        if start > stop {
            return Err(UsageError::InvalidTimeRange { start, stop });
        }
        Ok(Self { start, stop })
    }

    pub fn width(&self) -> TimeDelta {
        self.stop - self.start
    }

    /// Temporal midpoint at full (nanosecond) precision.
    pub fn midpoint(&self) -> NaiveDateTime {
        self.start + self.width() / 2
    }

    /// Splits at the midpoint into two adjacent windows sharing the midpoint as boundary.
    /// `None` when the midpoint coincides with an end, i.e. a half would equal the whole.
    pub fn bisect(&self) -> Option<(TimeWindow, TimeWindow)> {
        let mid = self.midpoint();
        if mid == self.start || mid == self.stop {
            return None;
        }
        Some((
            TimeWindow {
                start: self.start,
                stop: mid,
            },
            TimeWindow {
                start: mid,
                stop: self.stop,
            },
        ))
    }

    /// Widened by `slack` on both ends, saturating at the representable date range.
    pub fn expand(&self, slack: TimeDelta) -> TimeWindow {
        TimeWindow {
            start: self
                .start
                .checked_sub_signed(slack)
                .unwrap_or(NaiveDateTime::MIN),
            stop: self
                .stop
                .checked_add_signed(slack)
                .unwrap_or(NaiveDateTime::MAX),
        }
    }

    /// Closed containment: start <= ts <= stop.
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start && ts <= self.stop
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}",
            self.start.format("%Y-%m-%dT%H:%M:%S"),
            self.stop.format("%Y-%m-%dT%H:%M:%S")
        )
    }
}
