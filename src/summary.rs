// Cost summary of a billing export: domain -> group column value -> summed cost.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::NaiveDateTime;
use tracing::warn;

use crate::domain_cache::{DomainCache, UNKNOWN_DOMAIN};
use crate::models::Row;
use crate::time_range::isoformat;

const INDENT: &str = "    ";
const OTHER_GROUP: &str = "Other";

#[derive(Debug, Clone)]
pub struct Summary {
    project_id_column: String,
    cost_column: String,
    group_by: String,
    data: BTreeMap<String, BTreeMap<String, f64>>,
    total: f64,
}

impl Summary {
    pub fn new(project_id_column: &str, cost_column: &str, group_by: &str) -> Self {
        Self {
            project_id_column: project_id_column.to_string(),
            cost_column: cost_column.to_string(),
            group_by: group_by.to_string(),
            data: BTreeMap::new(),
            total: 0.0,
        }
    }

    pub async fn ingest(&mut self, row: &Row, domains: &mut DomainCache) {
        let project_id = row
            .get(&self.project_id_column)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_DOMAIN);
        let group = match row.get(&self.group_by) {
            Some(value) if !value.is_empty() => value.clone(),
            _ => OTHER_GROUP.to_string(),
        };
        let raw = row.get(&self.cost_column).map(|s| s.trim()).unwrap_or("");
        let cost = match raw.parse::<f64>() {
            Ok(cost) if cost.is_finite() => cost,
            _ => {
                warn!(column = %self.cost_column, value = %raw, "unparseable cost, using 0");
                0.0
            }
        };

        let domain = domains.domain_name(project_id).await;
        *self.data.entry(domain).or_default().entry(group).or_default() += cost;
        self.total += cost;
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn domain_total(&self, domain: &str) -> Option<f64> {
        self.data.get(domain).map(|groups| groups.values().sum())
    }

    pub fn group_cost(&self, domain: &str, group: &str) -> Option<f64> {
        self.data.get(domain)?.get(group).copied()
    }

    /// Domains and groups are printed in lexicographic order.
    pub fn output(&self, input: &str, now: NaiveDateTime) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Summarizing {} on {}", input, isoformat(now));
        let _ = writeln!(out, "Grouping on {}", self.group_by);
        for (domain, groups) in &self.data {
            let _ = writeln!(out, "{}:", domain);
            for (group, cost) in groups {
                let _ = writeln!(out, "{}{:<24}{:10.2}", INDENT, format!("{}:", group), cost);
            }
            let domain_total: f64 = groups.values().sum();
            let _ = writeln!(out, "{}{:<24}{:10.2}", INDENT, "Total:", domain_total);
        }
        let _ = writeln!(out, "Total:\t{:10.2}", self.total);
        out
    }
}
