// Telemetry sample: one data point of a meter for one resource.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Resource metadata as reported with a sample. Values are usually strings but may be any JSON.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Metadata keys that carry a resource lifecycle state.
pub const LIFECYCLE_KEYS: [&str; 2] = ["state", "status"];

/// Lifecycle states that mark a resource as gone (or going).
pub const DELETED_STATES: [&str; 2] = ["deleting", "deleted"];

/// Metering semantics of a sample; serializes to lowercase (e.g. "gauge").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CounterType {
    Gauge,
    Cumulative,
    Delta,
    /// Kept verbatim so reconstruction can report it.
    Unknown(String),
}

impl CounterType {
    /// Parse from the backend's counter type string (e.g. "gauge", "cumulative").
    pub fn from_backend(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "gauge" => CounterType::Gauge,
            "cumulative" => CounterType::Cumulative,
            "delta" => CounterType::Delta,
            _ => CounterType::Unknown(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CounterType::Gauge => "gauge",
            CounterType::Cumulative => "cumulative",
            CounterType::Delta => "delta",
            CounterType::Unknown(s) => s,
        }
    }
}

impl From<String> for CounterType {
    fn from(s: String) -> Self {
        CounterType::from_backend(&s)
    }
}

impl From<CounterType> for String {
    fn from(t: CounterType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for CounterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sample with its timestamp normalized to UTC-naive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub resource_id: String,
    pub project_id: String,
    pub meter: String,
    pub timestamp: NaiveDateTime,
    pub volume: f64,
    pub counter_type: CounterType,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Sample {
    /// Lifecycle state values present in metadata (`state`, then `status`).
    pub fn lifecycle_states(&self) -> impl Iterator<Item = &str> {
        LIFECYCLE_KEYS
            .iter()
            .filter_map(|key| self.metadata.get(*key))
            .filter_map(|v| v.as_str())
    }

    /// True when the sample reports a lifecycle state and none of them is deleted/deleting.
    pub fn is_live(&self) -> bool {
        let mut seen = false;
        for state in self.lifecycle_states() {
            if DELETED_STATES.contains(&state.to_lowercase().as_str()) {
                return false;
            }
            seen = true;
        }
        seen
    }
}
