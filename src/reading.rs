// Usage reconstruction for one resource over one billing window.
//
// Samples are split into prior / during / post the window. Only `during` samples contribute to
// the value; prior and post samples only tell us whether the resource was alive at the window
// edges. The value depends on the counter type of the first in-window sample:
//   gauge      -> trapezoidal integral of volume over time, in unit-hours
//   cumulative -> last volume minus first volume
//   delta      -> sum of volumes

use std::iter;

use chrono::{NaiveDateTime, TimeDelta};
use tracing::{debug, warn};

use crate::conversions::{ConversionRegistry, Resolution};
use crate::error::UsageError;
use crate::models::{CounterType, Metadata, Sample, TimeWindow};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Reconstructed usage of one resource for one window.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    window: TimeWindow,
    samples: Vec<Sample>,
    existed_before: bool,
    existed_after: bool,
    value: Option<f64>,
    metadata: Option<Metadata>,
}

impl Reading {
    /// `samples` must belong to one resource and be sorted ascending by timestamp.
    /// Fails with `UnknownCounterType` if the first in-window sample has unrecognized semantics.
    pub fn new(
        samples: impl IntoIterator<Item = Sample>,
        window: TimeWindow,
    ) -> Result<Self, UsageError> {
        let mut during = Vec::new();
        let mut existed_before = false;
        let mut existed_after = false;

        for sample in samples {
            debug!(
                resource_id = %sample.resource_id,
                timestamp = %sample.timestamp,
                meter = %sample.meter,
                volume = sample.volume,
                "sample"
            );
            if window.contains(sample.timestamp) {
                during.push(sample);
            } else if sample.timestamp < window.start {
                existed_before = true;
            } else {
                existed_after = true;
            }
        }

        let mut reading = Self {
            window,
            samples: during,
            existed_before,
            existed_after,
            value: None,
            metadata: None,
        };
        reading.value = reading.calculate()?;
        reading.metadata = reading.select_metadata();
        Ok(reading)
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn start(&self) -> NaiveDateTime {
        self.window.start
    }

    pub fn stop(&self) -> NaiveDateTime {
        self.window.stop
    }

    /// In-window samples, in time order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Absent iff there are no in-window samples (or a conversion failed).
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn resource_existed_before(&self) -> bool {
        self.existed_before
    }

    pub fn resource_existed_after(&self) -> bool {
        self.existed_after
    }

    pub fn resource_id(&self) -> Option<&str> {
        self.samples.first().map(|s| s.resource_id.as_str())
    }

    pub fn project_id(&self) -> Option<&str> {
        self.samples.first().map(|s| s.project_id.as_str())
    }

    pub fn meter_name(&self) -> Option<&str> {
        self.samples.last().map(|s| s.meter.as_str())
    }

    /// Counter type driving the calculation: that of the first in-window sample.
    pub fn meter_type(&self) -> Option<&CounterType> {
        self.samples.first().map(|s| &s.counter_type)
    }

    /// Window start if the resource was seen before it, else the first in-window sample.
    pub fn usage_start(&self) -> Option<NaiveDateTime> {
        let first = self.samples.first()?;
        Some(if self.existed_before {
            self.window.start
        } else {
            first.timestamp
        })
    }

    /// Window stop if the resource was seen after it, else the last in-window sample.
    pub fn usage_stop(&self) -> Option<NaiveDateTime> {
        let last = self.samples.last()?;
        Some(if self.existed_after {
            self.window.stop
        } else {
            last.timestamp
        })
    }

    /// Hours between usage start and usage stop.
    pub fn usage_hours(&self) -> Option<f64> {
        let (start, stop) = (self.usage_start()?, self.usage_stop()?);
        Some(seconds(stop - start) / SECONDS_PER_HOUR)
    }

    /// Replaces the value with the named conversion of it.
    /// No-op (returns None) when there is no value or no conversion name.
    /// A failed conversion leaves the value absent.
    pub fn convert(
        &mut self,
        registry: &ConversionRegistry,
        conversion: Option<&str>,
    ) -> Option<Resolution<f64>> {
        let (value, name) = (self.value?, conversion?);
        let result = registry.convert(name, value);
        self.value = result.clone().ok();
        if !result.is_resolved() {
            warn!(
                resource_id = self.resource_id().unwrap_or_default(),
                conversion = %name,
                "conversion unresolved, value dropped"
            );
        }
        Some(result)
    }

    fn calculate(&self) -> Result<Option<f64>, UsageError> {
        let (Some(first), Some(last)) = (self.samples.first(), self.samples.last()) else {
            return Ok(None);
        };
        let value = match &first.counter_type {
            CounterType::Gauge => {
                let start = self.usage_start().unwrap_or(first.timestamp);
                let stop = self.usage_stop().unwrap_or(last.timestamp);
                gauge_hours(&self.samples, start, stop)
            }
            CounterType::Cumulative => last.volume - first.volume,
            CounterType::Delta => self.samples.iter().map(|s| s.volume).sum(),
            CounterType::Unknown(t) => return Err(UsageError::UnknownCounterType(t.clone())),
        };
        Ok(Some(value))
    }

    /// Most recent in-window sample whose lifecycle state is not deleted/deleting;
    /// falls back to the last in-window sample. Some services clear metadata on delete,
    /// so the last live snapshot carries the billable attributes.
    fn select_metadata(&self) -> Option<Metadata> {
        self.samples
            .iter()
            .rev()
            .find(|s| s.is_live())
            .or_else(|| self.samples.last())
            .map(|s| s.metadata.clone())
    }
}

/// Trapezoidal integral of volume over [usage_start, usage_stop], in volume-hours.
/// The curve is padded with assumed points at usage start and stop holding the first
/// and last volumes; a padding point at an existing sample's timestamp adds nothing.
fn gauge_hours(samples: &[Sample], usage_start: NaiveDateTime, usage_stop: NaiveDateTime) -> f64 {
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return 0.0;
    };
    let points: Vec<(NaiveDateTime, f64)> = iter::once((usage_start, first.volume))
        .chain(samples.iter().map(|s| (s.timestamp, s.volume)))
        .chain(iter::once((usage_stop, last.volume)))
        .collect();

    let doubled_area: f64 = points
        .windows(2)
        .map(|w| seconds(w[1].0 - w[0].0) * (w[1].1 + w[0].1))
        .sum();
    doubled_area / 2.0 / SECONDS_PER_HOUR
}

fn seconds(delta: TimeDelta) -> f64 {
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9
}
