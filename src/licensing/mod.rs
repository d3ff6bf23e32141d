// Licensing reports over a billing export: a set of licensers fed row by row, rendered once.

mod licenser;
mod products;
mod rates;
mod tree;

pub use licenser::{DEFAULT_HOURS_FIELD, DEFAULT_PROJECT_ID_FIELD, LicenseMode, Licenser};
pub use products::{ORACLE, Product, SQLSERVER, WINDOWS};
pub use rates::{Rate, RateTable, lookup_rate};
pub use tree::{Group, INDENT_SIZE, Leaf, MAX_LINE_SIZE, Node, Quantity};

use tracing::info;

use crate::config::LicensingConfig;
use crate::domain_cache::DomainCache;
use crate::models::Row;

/// Licenser names accepted in config, with the policy each one builds.
pub const LICENSERS: [(&str, &Product, LicenseMode); 6] = [
    ("WindowsCount", &WINDOWS, LicenseMode::Count),
    ("WindowsHours", &WINDOWS, LicenseMode::Hours),
    ("SQLServerCount", &SQLSERVER, LicenseMode::Count),
    ("SQLServerHours", &SQLSERVER, LicenseMode::Hours),
    ("OracleCount", &ORACLE, LicenseMode::Count),
    ("OracleHours", &ORACLE, LicenseMode::Hours),
];

pub fn licenser_kind(name: &str) -> Option<(&'static Product, LicenseMode)> {
    LICENSERS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, product, mode)| (*product, *mode))
}

pub struct Licensing {
    licensers: Vec<Licenser>,
    rows: u64,
}

impl Licensing {
    pub fn new(licensers: Vec<Licenser>) -> Self {
        Self { licensers, rows: 0 }
    }

    pub fn from_config(config: &LicensingConfig) -> anyhow::Result<Self> {
        let licensers = config
            .licensers
            .iter()
            .map(|entry| {
                let (product, mode) = licenser_kind(&entry.kind)
                    .ok_or_else(|| anyhow::anyhow!("unknown licenser type {}", entry.kind))?;
                Ok(Licenser::new(product, mode, entry.costs.clone())
                    .with_fields(&config.project_id_field, &config.hours_field))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self::new(licensers))
    }

    pub fn licensers(&self) -> &[Licenser] {
        &self.licensers
    }

    /// Passes the row to every licenser.
    pub async fn ingest(&mut self, row: &Row, domains: &mut DomainCache) {
        self.rows += 1;
        for licenser in &mut self.licensers {
            licenser.ingest(row, domains).await;
        }
    }

    /// Rolls up every licenser and renders them separated by blank lines. Consumes the runner
    /// so totals are rolled up exactly once.
    pub fn output(mut self) -> String {
        info!(rows = self.rows, licensers = self.licensers.len(), "rendering licensing report");
        let mut out = String::from("\n");
        for licenser in &mut self.licensers {
            licenser.rollup();
            out.push_str(&licenser.render());
            out.push_str("\n\n");
        }
        out
    }
}
