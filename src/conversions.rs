// Named unit conversions, registered in a static table.
// Lookups that fail degrade to Resolution::Unresolved instead of an error.

use std::collections::HashMap;

use tracing::warn;

/// A unary conversion over a usage value. Errors mean "could not convert this value".
pub type ConversionFn = fn(f64) -> anyhow::Result<f64>;

/// Result of a best-effort lookup: either a value or a marker saying why there is none.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Resolved(T),
    Unresolved { name: String, reason: String },
}

impl<T> Resolution<T> {
    pub fn unresolved(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Resolution::Unresolved {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Resolution::Resolved(v) => Some(v),
            Resolution::Unresolved { .. } => None,
        }
    }
}

const CONVERSIONS: [(&str, ConversionFn); 4] = [
    ("seconds_to_hours", seconds_to_hours),
    ("hours_to_days", hours_to_days),
    ("bytes_to_gigabytes", bytes_to_gigabytes),
    ("megabytes_to_gigabytes", megabytes_to_gigabytes),
];

fn finite(value: f64) -> anyhow::Result<f64> {
    anyhow::ensure!(value.is_finite(), "value {} is not finite", value);
    Ok(value)
}

pub fn seconds_to_hours(s: f64) -> anyhow::Result<f64> {
    Ok(finite(s)? / 3600.0)
}

pub fn hours_to_days(h: f64) -> anyhow::Result<f64> {
    Ok(finite(h)? / 24.0)
}

pub fn bytes_to_gigabytes(b: f64) -> anyhow::Result<f64> {
    Ok(finite(b)? / 1024.0 / 1024.0 / 1024.0)
}

pub fn megabytes_to_gigabytes(mb: f64) -> anyhow::Result<f64> {
    Ok(finite(mb)? / 1024.0)
}

/// Conversion table, built once at startup and passed to whoever converts readings.
#[derive(Debug, Clone)]
pub struct ConversionRegistry {
    conversions: HashMap<&'static str, ConversionFn>,
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ConversionRegistry {
    pub fn builtin() -> Self {
        Self {
            conversions: CONVERSIONS.into_iter().collect(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<ConversionFn> {
        self.conversions.get(name).copied()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.conversions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Applies conversion `name` to `value`. Unknown names and failing conversions are logged.
    pub fn convert(&self, name: &str, value: f64) -> Resolution<f64> {
        let Some(conversion) = self.lookup(name) else {
            warn!(conversion = %name, "unknown conversion");
            return Resolution::unresolved(name, "unknown conversion");
        };
        match conversion(value) {
            Ok(v) => Resolution::Resolved(v),
            Err(e) => {
                warn!(conversion = %name, value, error = %e, "unable to convert value");
                Resolution::unresolved(name, e.to_string())
            }
        }
    }
}
