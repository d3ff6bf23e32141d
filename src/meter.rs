// Meter reads: plan queries, fetch samples, reconstruct one Reading per resource.

use std::iter::Peekable;
use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};
use futures_util::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info, instrument, warn};

use crate::error::UsageError;
use crate::models::{QueryFilter, Sample, ScheduleEntry, TimeWindow};
use crate::reading::Reading;
use crate::telemetry::{RawSample, TelemetryBackend, TimeWindowScheduler};

/// Fetch window is widened by this much on both ends so samples just outside the billing
/// window are seen and edge activity can be detected.
pub const DEFAULT_FETCH_SLACK_HOURS: i64 = 4;

pub struct MeterReader {
    backend: Arc<dyn TelemetryBackend>,
    scheduler: TimeWindowScheduler,
    fetch_slack: TimeDelta,
}

impl MeterReader {
    pub fn new(backend: Arc<dyn TelemetryBackend>, scheduler: TimeWindowScheduler) -> Self {
        Self {
            backend,
            scheduler,
            fetch_slack: TimeDelta::hours(DEFAULT_FETCH_SLACK_HOURS),
        }
    }

    pub fn with_fetch_slack(mut self, fetch_slack: TimeDelta) -> Self {
        self.fetch_slack = fetch_slack;
        self
    }

    /// Reads `meter` over [start, stop]. Checks the range before touching the backend.
    /// Sub-window queries run one after another; backend errors propagate unchanged.
    /// The returned sequence reconstructs one resource per step.
    #[instrument(skip(self, extra_filters), fields(meter = %meter))]
    pub async fn read(
        &self,
        meter: &str,
        start: NaiveDateTime,
        stop: NaiveDateTime,
        extra_filters: &[QueryFilter],
    ) -> Result<Readings, UsageError> {
        let window = TimeWindow::new(start, stop)?;
        let fetch_window = window.expand(self.fetch_slack);

        let schedule = self
            .scheduler
            .schedule(self.backend.as_ref(), meter, fetch_window, extra_filters)
            .await?;
        let expected: u64 = schedule.iter().map(|e| e.expected_count).sum();
        debug!(expected, sub_windows = schedule.len(), "samples according to count");

        let mut samples = self.fetch(meter, &schedule).await?;
        info!(samples = samples.len(), window = %window, "fetched samples");

        // Stable: equal (resource, timestamp) pairs keep backend order.
        samples.sort_by(|a, b| {
            a.resource_id
                .cmp(&b.resource_id)
                .then(a.timestamp.cmp(&b.timestamp))
        });
        Ok(Readings::new(samples, window))
    }

    async fn fetch(
        &self,
        meter: &str,
        schedule: &[ScheduleEntry],
    ) -> Result<Vec<Sample>, UsageError> {
        let batches: Vec<Vec<RawSample>> =
            stream::iter(schedule.iter().filter(|e| e.expected_count > 0))
                .then(|entry| {
                    self.backend
                        .list_samples(meter, &entry.filters, entry.expected_count)
                })
                .try_collect()
                .await?;

        batches
            .into_iter()
            .flatten()
            .map(RawSample::normalize)
            .collect()
    }
}

/// Lazy, single-pass sequence of readings over samples sorted by (resource, timestamp).
/// Adjacent samples of the same resource form one group.
#[derive(Debug)]
pub struct Readings {
    samples: Peekable<std::vec::IntoIter<Sample>>,
    window: TimeWindow,
}

impl Readings {
    pub fn new(sorted_samples: Vec<Sample>, window: TimeWindow) -> Self {
        Self {
            samples: sorted_samples.into_iter().peekable(),
            window,
        }
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }
}

impl Iterator for Readings {
    /// A per-resource error (unknown counter type) does not end the sequence.
    type Item = Result<Reading, UsageError>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.samples.next()?;
        let resource_id = first.resource_id.clone();
        let mut group = vec![first];
        while let Some(sample) = self.samples.next_if(|s| s.resource_id == resource_id) {
            group.push(sample);
        }

        let reading = Reading::new(group, self.window);
        if let Err(e) = &reading {
            warn!(resource_id = %resource_id, error = %e, "unable to reconstruct reading");
        }
        Some(reading)
    }
}
