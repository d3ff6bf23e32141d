// Telemetry backend seam: sample counts and sample listings for a meter.
// Transport (HTTP client, auth, retry) lives behind the trait.

pub mod scheduler;
mod timestamp;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::UsageError;
use crate::models::{CounterType, Metadata, QueryFilter, Sample};

pub use scheduler::TimeWindowScheduler;
pub use timestamp::normalize_timestamp;

#[async_trait]
pub trait TelemetryBackend: Send + Sync {
    /// Number of samples of `meter` matching `filters`.
    async fn count(&self, meter: &str, filters: &[QueryFilter]) -> anyhow::Result<u64>;

    /// Up to `limit` samples of `meter` matching `filters`, in backend order.
    async fn list_samples(
        &self,
        meter: &str,
        filters: &[QueryFilter],
        limit: u64,
    ) -> anyhow::Result<Vec<RawSample>>;
}

/// Sample as returned by the backend, timestamp still an ISO-8601 string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub resource_id: String,
    pub project_id: String,
    #[serde(alias = "counter_name")]
    pub meter: String,
    pub timestamp: String,
    #[serde(alias = "counter_volume")]
    pub volume: f64,
    pub counter_type: String,
    #[serde(default, alias = "resource_metadata")]
    pub metadata: Metadata,
}

impl RawSample {
    /// Parses the timestamp to UTC-naive and types the counter.
    pub fn normalize(self) -> Result<Sample, UsageError> {
        let timestamp = normalize_timestamp(&self.timestamp)?;
        Ok(Sample {
            resource_id: self.resource_id,
            project_id: self.project_id,
            meter: self.meter,
            timestamp,
            volume: self.volume,
            counter_type: CounterType::from_backend(&self.counter_type),
            metadata: self.metadata,
        })
    }
}
