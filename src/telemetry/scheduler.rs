// Count-probe-and-bisect query planning.
// Each sub-window is probed; windows over the per-query ceiling are split at the midpoint
// and both halves are probed against the same ceiling. Output is in chronological order.

use chrono::TimeDelta;
use tracing::{debug, instrument, warn};

use super::TelemetryBackend;
use crate::error::UsageError;
use crate::models::{QueryFilter, ScheduleEntry, TimeWindow, with_time_filters};

#[derive(Debug, Clone)]
pub struct TimeWindowScheduler {
    max_samples: u64,
    min_window: TimeDelta,
}

impl TimeWindowScheduler {
    /// A zero `min_window` still terminates: splitting stops once a window is too narrow
    /// to halve at nanosecond precision.
    pub fn new(max_samples: u64, min_window: TimeDelta) -> Self {
        Self {
            max_samples,
            min_window,
        }
    }

    pub fn max_samples(&self) -> u64 {
        self.max_samples
    }

    /// Partition `window` into sub-windows whose sample count is at most `max_samples`.
    /// Fails with `WindowTooDense` when a window still over the ceiling is no wider than
    /// `min_window` or can no longer be split into two strictly smaller halves.
    #[instrument(skip(self, backend, extra_filters), fields(meter = %meter, window = %window, max_samples = self.max_samples))]
    pub async fn schedule(
        &self,
        backend: &dyn TelemetryBackend,
        meter: &str,
        window: TimeWindow,
        extra_filters: &[QueryFilter],
    ) -> Result<Vec<ScheduleEntry>, UsageError> {
        let mut pending = vec![window];
        let mut entries = Vec::new();
        let mut probes: u32 = 0;

        while let Some(current) = pending.pop() {
            let filters = with_time_filters(extra_filters, &current);
            let count = backend.count(meter, &filters).await?;
            probes += 1;

            if count <= self.max_samples {
                debug!(window = %current, count, "scheduled");
                entries.push(ScheduleEntry {
                    window: current,
                    filters,
                    expected_count: count,
                });
                continue;
            }

            let halves = if current.width() <= self.min_window {
                None
            } else {
                current.bisect()
            };
            let Some((left, right)) = halves else {
                warn!(window = %current, count, "window too dense to split");
                return Err(UsageError::WindowTooDense {
                    start: current.start,
                    stop: current.stop,
                    count,
                    max: self.max_samples,
                });
            };

            // Right pushed first so the left half is probed (and emitted) first.
            pending.push(right);
            pending.push(left);
        }

        debug!(probes, sub_windows = entries.len(), "schedule complete");
        Ok(entries)
    }
}
