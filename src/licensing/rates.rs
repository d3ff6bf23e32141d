// Rate table: edition (or distro) -> version -> rate per unit of quantity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::conversions::Resolution;

/// Rates may be written as numbers or numeric strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rate {
    Number(f64),
    Text(String),
}

impl Rate {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Rate::Number(n) => Some(*n),
            Rate::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<f64> for Rate {
    fn from(n: f64) -> Self {
        Rate::Number(n)
    }
}

pub type RateTable = BTreeMap<String, BTreeMap<String, Rate>>;

pub fn lookup_rate(table: &RateTable, edition: &str, version: &str) -> Resolution<f64> {
    let name = format!("{}/{}", edition, version);
    let Some(rate) = table.get(edition).and_then(|versions| versions.get(version)) else {
        return Resolution::unresolved(name, "no rate");
    };
    match rate.as_f64() {
        Some(r) => Resolution::Resolved(r),
        None => Resolution::unresolved(name, format!("rate {:?} is not numeric", rate)),
    }
}
