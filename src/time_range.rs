// Common report windows, in naive UTC.

use chrono::{Datelike, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc};

use crate::models::TimeWindow;

/// Start of the current month to `now`.
pub fn mtd_range_at(now: NaiveDateTime) -> TimeWindow {
    let first = now.date().with_day(1).unwrap_or(now.date());
    TimeWindow {
        start: first.and_time(NaiveTime::MIN),
        stop: now,
    }
}

/// Midnight to `now`.
pub fn today_range_at(now: NaiveDateTime) -> TimeWindow {
    TimeWindow {
        start: now.date().and_time(NaiveTime::MIN),
        stop: now,
    }
}

/// One hour ago to `now`.
pub fn last_hour_range_at(now: NaiveDateTime) -> TimeWindow {
    TimeWindow {
        start: now - TimeDelta::hours(1),
        stop: now,
    }
}

pub fn mtd_range() -> TimeWindow {
    mtd_range_at(Utc::now().naive_utc())
}

pub fn today_range() -> TimeWindow {
    today_range_at(Utc::now().naive_utc())
}

pub fn last_hour_range() -> TimeWindow {
    last_hour_range_at(Utc::now().naive_utc())
}

/// ISO 8601 without offset; microseconds only when non-zero.
pub fn isoformat(ts: NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}
