// One licensing policy: product relevance + count or hours accumulation into a grouping tree.

use tracing::{debug, warn};

use super::products::Product;
use super::rates::{RateTable, lookup_rate};
use super::tree::{Group, Leaf, Quantity};
use crate::conversions::Resolution;
use crate::domain_cache::{DomainCache, UNKNOWN_DOMAIN};
use crate::models::Row;

pub const DEFAULT_PROJECT_ID_FIELD: &str = "Project Id";
pub const DEFAULT_HOURS_FIELD: &str = "Hours";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseMode {
    /// One unit per relevant row.
    Count,
    /// The row's hours column.
    Hours,
}

impl LicenseMode {
    fn empty_leaf(self) -> Leaf {
        match self {
            LicenseMode::Count => Leaf::empty_count(),
            LicenseMode::Hours => Leaf::empty_hours(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Licenser {
    product: &'static Product,
    mode: LicenseMode,
    costs: RateTable,
    project_id_field: String,
    hours_field: String,
    data: Group,
}

impl Licenser {
    pub fn new(product: &'static Product, mode: LicenseMode, costs: RateTable) -> Self {
        Self {
            product,
            mode,
            costs,
            project_id_field: DEFAULT_PROJECT_ID_FIELD.to_string(),
            hours_field: DEFAULT_HOURS_FIELD.to_string(),
            data: Group::default(),
        }
    }

    pub fn with_fields(mut self, project_id_field: &str, hours_field: &str) -> Self {
        self.project_id_field = project_id_field.to_string();
        self.hours_field = hours_field.to_string();
        self
    }

    pub fn product(&self) -> &'static Product {
        self.product
    }

    pub fn mode(&self) -> LicenseMode {
        self.mode
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            LicenseMode::Count => self.product.count_title,
            LicenseMode::Hours => self.product.hours_title,
        }
    }

    pub fn data(&self) -> &Group {
        &self.data
    }

    /// Adds one export row. Rows the product does not cover are dropped.
    pub async fn ingest(&mut self, row: &Row, domains: &mut DomainCache) {
        if !self.product.relevant(row) {
            return;
        }

        let project_id = row
            .get(&self.project_id_field)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_DOMAIN);
        let path = [
            domains.domain_name(project_id).await,
            group_key(row, self.product.edition_key),
            group_key(row, self.product.version_key),
        ];

        let quantity = match self.mode {
            LicenseMode::Count => 1.0,
            LicenseMode::Hours => self.row_hours(row),
        };
        let cost = self.row_cost(row, quantity);

        let Some(leaf) = self.data.drill_down(&path, self.mode.empty_leaf()) else {
            warn!(path = ?path, "licensing path collides with an existing node, row skipped");
            return;
        };
        leaf.cost += cost;
        leaf.quantity = match leaf.quantity {
            Quantity::Count(n) => Quantity::Count(n + 1),
            Quantity::Hours(h) => Quantity::Hours(h + quantity),
        };
        debug!(product = self.product.name, path = ?path, cost, "row licensed");
    }

    /// Sums totals up the tree. Single use: a second call double-counts.
    pub fn rollup(&mut self) -> f64 {
        self.data.rollup()
    }

    /// Title, underline and the tree. Does not roll up.
    pub fn render(&self) -> String {
        let title = self.title();
        let mut lines = vec![title.to_string(), "=".repeat(title.len())];
        self.data.render_lines(&mut lines);
        lines.join("\n")
    }

    fn row_hours(&self, row: &Row) -> f64 {
        let raw = row.get(&self.hours_field).map(|s| s.trim()).unwrap_or("");
        match raw.parse::<f64>() {
            Ok(hours) if hours.is_finite() => hours,
            _ => {
                warn!(field = %self.hours_field, value = %raw, "unparseable hours, using 0");
                0.0
            }
        }
    }

    fn row_cost(&self, row: &Row, quantity: f64) -> f64 {
        let edition = row.get(self.product.edition_key).map(String::as_str).unwrap_or("");
        let version = row.get(self.product.version_key).map(String::as_str).unwrap_or("");
        match lookup_rate(&self.costs, edition, version) {
            Resolution::Resolved(rate) => rate * quantity,
            Resolution::Unresolved { name, reason } => {
                warn!(product = self.product.name, rate = %name, reason = %reason, "unable to find rate");
                0.0
            }
        }
    }
}

fn group_key(row: &Row, field: &str) -> String {
    match row.get(field) {
        Some(value) if !value.is_empty() => value.clone(),
        _ => UNKNOWN_DOMAIN.to_string(),
    }
}
