// Billing export input: a JSON array of flat row objects.

use anyhow::Context;
use serde_json::Value;

use crate::models::Row;

pub fn load_rows(path: &str) -> anyhow::Result<Vec<Row>> {
    let s = std::fs::read_to_string(path).with_context(|| format!("reading input {}", path))?;
    rows_from_str(&s).with_context(|| format!("parsing input {}", path))
}

/// Non-string cells are kept as their JSON text; nulls become empty strings.
pub fn rows_from_str(s: &str) -> anyhow::Result<Vec<Row>> {
    let objects: Vec<serde_json::Map<String, Value>> = serde_json::from_str(s)?;
    Ok(objects
        .into_iter()
        .map(|object| {
            object
                .into_iter()
                .map(|(column, value)| {
                    let cell = match value {
                        Value::String(s) => s,
                        Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    (column, cell)
                })
                .collect()
        })
        .collect())
}
