// ISO-8601 parsing and normalization to UTC-naive.

use chrono::{DateTime, NaiveDateTime};

use crate::error::UsageError;

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses an ISO-8601 timestamp. Offsets are applied and dropped; naive input is taken as UTC.
pub fn normalize_timestamp(s: &str) -> Result<NaiveDateTime, UsageError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.naive_utc());
        }
    }
    let mut last_err = None;
    for fmt in NAIVE_FORMATS {
        match NaiveDateTime::parse_from_str(s, fmt) {
            Ok(ts) => return Ok(ts),
            Err(e) => last_err = Some(e),
        }
    }
    Err(UsageError::InvalidTimestamp {
        value: s.to_string(),
        reason: last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "empty".into()),
    })
}
