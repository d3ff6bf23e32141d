// Telemetry query filters: (field, op, value, type), as the backend's query language expects.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::TimeWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
    #[serde(rename = "type", default)]
    pub value_type: String,
}

impl QueryFilter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
            value_type: String::new(),
        }
    }

    pub fn timestamp(op: FilterOp, ts: NaiveDateTime) -> Self {
        Self {
            field: "timestamp".into(),
            op,
            value: ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            value_type: "datetime".into(),
        }
    }

    pub fn is_time_filter(&self) -> bool {
        self.field == "timestamp"
    }
}

/// Time filters for a half-open window: timestamp > start AND timestamp <= stop.
pub fn time_filters(window: &TimeWindow) -> [QueryFilter; 2] {
    [
        QueryFilter::timestamp(FilterOp::Gt, window.start),
        QueryFilter::timestamp(FilterOp::Le, window.stop),
    ]
}

/// `extra` (minus any caller-supplied time filters) followed by the window's time filters.
pub fn with_time_filters(extra: &[QueryFilter], window: &TimeWindow) -> Vec<QueryFilter> {
    let mut out: Vec<QueryFilter> = extra
        .iter()
        .filter(|f| !f.is_time_filter())
        .cloned()
        .collect();
    out.extend(time_filters(window));
    out
}
