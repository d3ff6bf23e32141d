// Shared test helpers
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use cloud_usage::domain_cache::DomainResolver;
use cloud_usage::models::*;
use cloud_usage::telemetry::{RawSample, TelemetryBackend, normalize_timestamp};

pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
}

pub fn window(start: &str, stop: &str) -> TimeWindow {
    TimeWindow::new(ts(start), ts(stop)).unwrap()
}

pub fn sample(resource_id: &str, timestamp: &str, volume: f64, counter_type: &str) -> Sample {
    Sample {
        resource_id: resource_id.into(),
        project_id: "p1".into(),
        meter: "instance".into(),
        timestamp: ts(timestamp),
        volume,
        counter_type: CounterType::from_backend(counter_type),
        metadata: Metadata::new(),
    }
}

pub fn with_metadata(mut sample: Sample, metadata: serde_json::Value) -> Sample {
    if let serde_json::Value::Object(map) = metadata {
        sample.metadata = map;
    }
    sample
}

pub fn raw(resource_id: &str, timestamp: &str, volume: f64, counter_type: &str) -> RawSample {
    RawSample {
        resource_id: resource_id.into(),
        project_id: "p1".into(),
        meter: "instance".into(),
        timestamp: timestamp.into(),
        volume,
        counter_type: counter_type.into(),
        metadata: Metadata::new(),
    }
}

pub fn row(cells: &[(&str, &str)]) -> Row {
    cells
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// In-memory backend. Applies `timestamp gt/le` and `resource_id eq` filters, records calls.
#[derive(Default)]
pub struct FakeBackend {
    samples: Vec<RawSample>,
    fail_count: bool,
    fail_list: bool,
    count_calls: Mutex<Vec<Vec<QueryFilter>>>,
    list_calls: Mutex<Vec<(Vec<QueryFilter>, u64)>>,
}

impl FakeBackend {
    pub fn new(samples: Vec<RawSample>) -> Self {
        Self {
            samples,
            ..Default::default()
        }
    }

    pub fn failing_count() -> Self {
        Self {
            fail_count: true,
            ..Default::default()
        }
    }

    pub fn failing_list(samples: Vec<RawSample>) -> Self {
        Self {
            samples,
            fail_list: true,
            ..Default::default()
        }
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.lock().unwrap().len()
    }

    pub fn list_calls(&self) -> Vec<(Vec<QueryFilter>, u64)> {
        self.list_calls.lock().unwrap().clone()
    }

    fn matching(&self, filters: &[QueryFilter]) -> Vec<RawSample> {
        self.samples
            .iter()
            .filter(|s| filters.iter().all(|f| matches_filter(s, f)))
            .cloned()
            .collect()
    }
}

fn matches_filter(sample: &RawSample, filter: &QueryFilter) -> bool {
    match filter.field.as_str() {
        "timestamp" => {
            let at = normalize_timestamp(&sample.timestamp).unwrap();
            let bound = normalize_timestamp(&filter.value).unwrap();
            match filter.op {
                FilterOp::Gt => at > bound,
                FilterOp::Ge => at >= bound,
                FilterOp::Lt => at < bound,
                FilterOp::Le => at <= bound,
                FilterOp::Eq => at == bound,
                FilterOp::Ne => at != bound,
            }
        }
        "resource_id" => match filter.op {
            FilterOp::Eq => sample.resource_id == filter.value,
            FilterOp::Ne => sample.resource_id != filter.value,
            _ => true,
        },
        _ => true,
    }
}

#[async_trait]
impl TelemetryBackend for FakeBackend {
    async fn count(&self, _meter: &str, filters: &[QueryFilter]) -> anyhow::Result<u64> {
        self.count_calls.lock().unwrap().push(filters.to_vec());
        anyhow::ensure!(!self.fail_count, "count endpoint unavailable");
        Ok(self.matching(filters).len() as u64)
    }

    async fn list_samples(
        &self,
        _meter: &str,
        filters: &[QueryFilter],
        limit: u64,
    ) -> anyhow::Result<Vec<RawSample>> {
        self.list_calls
            .lock()
            .unwrap()
            .push((filters.to_vec(), limit));
        anyhow::ensure!(!self.fail_list, "sample endpoint unavailable");
        // Newest first, like the real service.
        let mut samples = self.matching(filters);
        samples.reverse();
        samples.truncate(limit as usize);
        Ok(samples)
    }
}

/// Resolver over a fixed table that counts lookups; unknown projects fail.
#[derive(Default)]
pub struct CountingResolver {
    domains: HashMap<String, String>,
    calls: AtomicUsize,
}

impl CountingResolver {
    pub fn new(domains: &[(&str, &str)]) -> Self {
        Self {
            domains: domains
                .iter()
                .map(|(p, d)| (p.to_string(), d.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DomainResolver for CountingResolver {
    async fn domain_for_project(&self, project_id: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.domains
            .get(project_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("project {} not found", project_id))
    }
}

pub fn domain_table(domains: &[(&str, &str)]) -> BTreeMap<String, String> {
    domains
        .iter()
        .map(|(p, d)| (p.to_string(), d.to_string()))
        .collect()
}
