// One planned sample query: a sub-window, its full filter set, and the probed sample count.

use serde::{Deserialize, Serialize};

use super::{QueryFilter, TimeWindow};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub window: TimeWindow,
    /// Caller filters plus this sub-window's time filters.
    pub filters: Vec<QueryFilter>,
    /// Count reported by the backend for this sub-window; never above the per-query maximum.
    pub expected_count: u64,
}
