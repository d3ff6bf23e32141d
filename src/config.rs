use std::collections::BTreeMap;

use chrono::TimeDelta;
use serde::Deserialize;

use crate::licensing::{DEFAULT_HOURS_FIELD, DEFAULT_PROJECT_ID_FIELD, RateTable, licenser_kind};
use crate::meter::DEFAULT_FETCH_SLACK_HOURS;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub licensing: LicensingConfig,
    pub summary: Option<SummaryConfig>,
    /// Project id -> domain name.
    #[serde(default)]
    pub domains: BTreeMap<String, String>,
}

/// One year; wider slack is never useful and large values overflow `TimeDelta`.
const MAX_FETCH_SLACK_HOURS: i64 = 24 * 366;
const MAX_MIN_WINDOW_SECS: i64 = 24 * 3600;

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_max_samples_per_query")]
    pub max_samples_per_query: u64,
    /// Hours fetched on each side of a billing window so readings see prior/later samples.
    #[serde(default = "default_fetch_slack_hours")]
    pub fetch_slack_hours: i64,
    /// Narrowest window the scheduler will still bisect.
    #[serde(default = "default_min_window_secs")]
    pub min_window_secs: i64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            max_samples_per_query: default_max_samples_per_query(),
            fetch_slack_hours: default_fetch_slack_hours(),
            min_window_secs: default_min_window_secs(),
        }
    }
}

impl TelemetryConfig {
    pub fn fetch_slack(&self) -> TimeDelta {
        TimeDelta::hours(self.fetch_slack_hours)
    }

    pub fn min_window(&self) -> TimeDelta {
        TimeDelta::seconds(self.min_window_secs)
    }
}

fn default_max_samples_per_query() -> u64 {
    1000
}

fn default_fetch_slack_hours() -> i64 {
    DEFAULT_FETCH_SLACK_HOURS
}

fn default_min_window_secs() -> i64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Billing export: a JSON array of row objects.
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LicensingConfig {
    #[serde(default = "default_project_id_field")]
    pub project_id_field: String,
    #[serde(default = "default_hours_field")]
    pub hours_field: String,
    #[serde(default)]
    pub licensers: Vec<LicenserConfig>,
}

impl Default for LicensingConfig {
    fn default() -> Self {
        Self {
            project_id_field: default_project_id_field(),
            hours_field: default_hours_field(),
            licensers: Vec::new(),
        }
    }
}

fn default_project_id_field() -> String {
    DEFAULT_PROJECT_ID_FIELD.into()
}

fn default_hours_field() -> String {
    DEFAULT_HOURS_FIELD.into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LicenserConfig {
    #[serde(rename = "type")]
    pub kind: String,
    /// Edition (or OS distro) -> version -> rate.
    #[serde(default)]
    pub costs: RateTable,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryConfig {
    pub project_id_column: String,
    pub cost_column: String,
    pub group_by: String,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.telemetry.max_samples_per_query > 0,
            "telemetry.max_samples_per_query must be > 0, got {}",
            self.telemetry.max_samples_per_query
        );
        anyhow::ensure!(
            (0..=MAX_FETCH_SLACK_HOURS).contains(&self.telemetry.fetch_slack_hours),
            "telemetry.fetch_slack_hours must be in 0..={}, got {}",
            MAX_FETCH_SLACK_HOURS,
            self.telemetry.fetch_slack_hours
        );
        anyhow::ensure!(
            (1..=MAX_MIN_WINDOW_SECS).contains(&self.telemetry.min_window_secs),
            "telemetry.min_window_secs must be in 1..={}, got {}",
            MAX_MIN_WINDOW_SECS,
            self.telemetry.min_window_secs
        );
        anyhow::ensure!(!self.input.path.is_empty(), "input.path must be non-empty");
        anyhow::ensure!(
            !self.licensing.project_id_field.is_empty(),
            "licensing.project_id_field must be non-empty"
        );
        anyhow::ensure!(
            !self.licensing.hours_field.is_empty(),
            "licensing.hours_field must be non-empty"
        );
        for licenser in &self.licensing.licensers {
            anyhow::ensure!(
                licenser_kind(&licenser.kind).is_some(),
                "licensing.licensers: unknown type {}",
                licenser.kind
            );
        }
        if let Some(summary) = &self.summary {
            anyhow::ensure!(
                !summary.project_id_column.is_empty(),
                "summary.project_id_column must be non-empty"
            );
            anyhow::ensure!(
                !summary.cost_column.is_empty(),
                "summary.cost_column must be non-empty"
            );
            anyhow::ensure!(!summary.group_by.is_empty(), "summary.group_by must be non-empty");
        }
        Ok(())
    }
}
