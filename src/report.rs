// Report runs: read every item's meter over a window and turn each reading into a row.
// Rows are keyed by the definition's field names; writing them out is the caller's job.

use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::TelemetryConfig;
use crate::conversions::ConversionRegistry;
use crate::error::UsageError;
use crate::fields::{FieldRegistry, Item, METADATA_PREFIX};
use crate::meter::MeterReader;
use crate::models::{Row, TimeWindow};
use crate::reading::Reading;
use crate::telemetry::{TelemetryBackend, TimeWindowScheduler};
use crate::time_range;

/// Named report windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportRange {
    #[default]
    MonthToDate,
    Today,
    LastHour,
}

impl ReportRange {
    pub fn window(self) -> TimeWindow {
        match self {
            ReportRange::MonthToDate => time_range::mtd_range(),
            ReportRange::Today => time_range::today_range(),
            ReportRange::LastHour => time_range::last_hour_range(),
        }
    }
}

/// Output columns plus one item per meter. Items carry `meter_name`, an optional
/// `conversion` and whatever passthrough keys the field functions read.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportDefinition {
    pub fieldnames: Vec<String>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub range: ReportRange,
}

impl ReportDefinition {
    pub fn validate(&self, fields: &FieldRegistry) -> anyhow::Result<()> {
        anyhow::ensure!(!self.fieldnames.is_empty(), "report.fieldnames must be non-empty");
        for name in &self.fieldnames {
            anyhow::ensure!(
                fields.contains(&field_key(name)),
                "report.fieldnames: unknown field {}",
                name
            );
        }
        for (i, item) in self.items.iter().enumerate() {
            anyhow::ensure!(
                meter_name(item).is_some_and(|m| !m.is_empty()),
                "report.items[{}]: meter_name must be a non-empty string",
                i
            );
        }
        Ok(())
    }
}

/// Column name to field function name: lowercased, spaces and dots become underscores.
/// `metadata:<key>` names are passed through untouched.
pub fn field_key(name: &str) -> String {
    if name.starts_with(METADATA_PREFIX) {
        return name.to_string();
    }
    name.to_lowercase().replace([' ', '.'], "_")
}

fn meter_name(item: &Item) -> Option<&str> {
    item.get("meter_name").and_then(Value::as_str)
}

pub struct Report {
    reader: MeterReader,
    conversions: ConversionRegistry,
    fields: FieldRegistry,
    definition: ReportDefinition,
}

impl Report {
    pub fn new(reader: MeterReader, definition: ReportDefinition) -> Self {
        Self {
            reader,
            conversions: ConversionRegistry::builtin(),
            fields: FieldRegistry::builtin(),
            definition,
        }
    }

    /// Validates `definition`, then builds the reader from `[telemetry]` settings.
    pub fn from_config(
        backend: Arc<dyn TelemetryBackend>,
        telemetry: &TelemetryConfig,
        definition: ReportDefinition,
    ) -> anyhow::Result<Self> {
        definition.validate(&FieldRegistry::builtin())?;
        let scheduler =
            TimeWindowScheduler::new(telemetry.max_samples_per_query, telemetry.min_window());
        let reader = MeterReader::new(backend, scheduler).with_fetch_slack(telemetry.fetch_slack());
        Ok(Self::new(reader, definition))
    }

    pub fn definition(&self) -> &ReportDefinition {
        &self.definition
    }

    /// One row per reading per item. A resource that cannot be reconstructed is skipped;
    /// a bad window or a backend failure ends the run.
    #[instrument(skip(self, window), fields(window = %window, items = self.definition.items.len()))]
    pub async fn run(&self, window: TimeWindow) -> Result<Vec<Row>, UsageError> {
        let started = Instant::now();
        let mut rows = Vec::new();

        for item in &self.definition.items {
            let Some(meter) = meter_name(item) else {
                warn!("report item without meter_name skipped");
                continue;
            };
            let conversion = item.get("conversion").and_then(Value::as_str);

            let readings = self.reader.read(meter, window.start, window.stop, &[]).await?;
            let before = rows.len();
            for reading in readings {
                let Ok(mut reading) = reading else {
                    continue;
                };
                reading.convert(&self.conversions, conversion);
                rows.push(self.row(item, &reading));
            }
            debug!(meter = %meter, rows = rows.len() - before, "item done");
        }

        info!(
            rows = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "report finished"
        );
        Ok(rows)
    }

    /// Unresolved and absent values become empty cells.
    fn row(&self, item: &Item, reading: &Reading) -> Row {
        self.definition
            .fieldnames
            .iter()
            .map(|name| {
                let value = self
                    .fields
                    .evaluate(&field_key(name), item, reading)
                    .ok()
                    .flatten()
                    .unwrap_or_default();
                (name.clone(), value)
            })
            .collect()
    }
}
