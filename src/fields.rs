// Field functions: named, pure mappings from (report item, Reading) to an output column value.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use crate::conversions::{Resolution, seconds_to_hours};
use crate::models::Metadata;
use crate::reading::Reading;
use crate::time_range::isoformat;

/// A report item definition (description, item_rate, product_name, ...).
pub type Item = serde_json::Map<String, Value>;

pub type FieldFn = fn(&Item, &Reading) -> anyhow::Result<Option<String>>;

/// Prefix of field names resolved from reading metadata instead of the table.
pub const METADATA_PREFIX: &str = "metadata:";

const FIELDS: [(&str, FieldFn); 25] = [
    ("availability_zone", availability_zone),
    ("billing_entity", |i, _| Ok(Some(item_str(i, "billing_entity")))),
    ("billing_period_end_date", |_, r| Ok(Some(isoformat(r.stop())))),
    ("billing_period_start_date", |_, r| Ok(Some(isoformat(r.start())))),
    ("cost", cost),
    ("currency_code", |i, _| Ok(Some(item_str(i, "currency_code")))),
    ("description", |i, _| Ok(Some(item_str(i, "description")))),
    ("display_name", |_, r| Ok(metadata_value(r, "display_name"))),
    ("hours", hours),
    ("instance_type", |_, r| Ok(metadata_value(r, "instance_type"))),
    ("item_rate", |i, _| Ok(Some(item_rate(i)?.to_string()))),
    ("line_item_type", |i, _| Ok(Some(item_str(i, "line_item_type")))),
    ("meter_name", |i, _| Ok(i.get("meter_name").map(value_string))),
    ("operation", |i, _| Ok(Some(item_str(i, "operation")))),
    ("payer_account_id", |_, r| Ok(r.project_id().map(str::to_string))),
    ("product_code", |i, _| Ok(Some(item_str(i, "product_code")))),
    ("product_name", |i, _| Ok(Some(item_str(i, "product_name")))),
    ("project_id", |_, r| Ok(r.project_id().map(str::to_string))),
    ("resource_id", |_, r| Ok(r.resource_id().map(str::to_string))),
    ("timeinterval", timeinterval),
    ("usage_account_id", |_, r| Ok(r.project_id().map(str::to_string))),
    ("usage_amount", |_, r| Ok(r.value().map(|v| v.to_string()))),
    ("usage_end_date", |_, r| Ok(r.usage_stop().map(isoformat))),
    ("usage_start_date", |_, r| Ok(r.usage_start().map(isoformat))),
    ("usage_type", |i, _| Ok(Some(item_str(i, "usage_type")))),
];

/// Field function table, built once at startup.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: HashMap<&'static str, FieldFn>,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FieldRegistry {
    pub fn builtin() -> Self {
        Self {
            fields: FIELDS.into_iter().collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        name.starts_with(METADATA_PREFIX) || self.fields.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.fields.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Runs field `name`. `metadata:<key>` names look the key up in the reading metadata.
    /// Unknown names and failing functions are logged and come back unresolved.
    pub fn evaluate(
        &self,
        name: &str,
        item: &Item,
        reading: &Reading,
    ) -> Resolution<Option<String>> {
        if let Some(key) = name.strip_prefix(METADATA_PREFIX) {
            return Resolution::Resolved(metadata_field(reading, key));
        }
        let Some(field) = self.fields.get(name) else {
            warn!(field = %name, "unknown field function");
            return Resolution::unresolved(name, "unknown field function");
        };
        match field(item, reading) {
            Ok(value) => Resolution::Resolved(value),
            Err(e) => {
                warn!(field = %name, error = %e, "unable to get value for field function");
                Resolution::unresolved(name, e.to_string())
            }
        }
    }
}

/// Looks up `metadata.<key>`, then `properties.<key>`, then `<key>`, ignoring case.
/// Falls back to a `metadata` list of `{key, value}` objects.
pub fn metadata_field(reading: &Reading, key: &str) -> Option<String> {
    let metadata = reading.metadata()?;
    [
        format!("metadata.{}", key),
        format!("properties.{}", key),
        key.to_string(),
    ]
    .iter()
    .find_map(|k| get_insensitive(metadata, k).and_then(non_empty))
    .or_else(|| metadata_list_value(metadata, key))
}

fn metadata_list_value(metadata: &Metadata, key: &str) -> Option<String> {
    let list = match metadata.get("metadata")? {
        Value::Array(list) => list.clone(),
        Value::String(s) => serde_json::from_str::<Vec<Value>>(s).ok()?,
        _ => return None,
    };
    list.iter()
        .find(|obj| {
            obj.get("key")
                .and_then(Value::as_str)
                .is_some_and(|k| k.eq_ignore_ascii_case(key))
        })
        .and_then(|obj| obj.get("value"))
        .and_then(non_empty)
}

fn get_insensitive<'a>(metadata: &'a Metadata, key: &str) -> Option<&'a Value> {
    metadata
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

fn non_empty(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(value_string(other)),
    }
}

fn value_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn item_str(item: &Item, key: &str) -> String {
    item.get(key).map(value_string).unwrap_or_default()
}

fn item_rate(item: &Item) -> anyhow::Result<f64> {
    match item.get("item_rate") {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| anyhow::anyhow!("item_rate {} is not representable", n)),
        Some(Value::String(s)) => Ok(s.trim().parse()?),
        Some(other) => anyhow::bail!("item_rate {} is not numeric", other),
    }
}

fn metadata_value(reading: &Reading, key: &str) -> Option<String> {
    reading.metadata()?.get(key).and_then(non_empty)
}

fn availability_zone(_: &Item, reading: &Reading) -> anyhow::Result<Option<String>> {
    Ok(Some(metadata_value(reading, "availability_zone").unwrap_or_default()))
}

fn cost(item: &Item, reading: &Reading) -> anyhow::Result<Option<String>> {
    let value = reading
        .value()
        .ok_or_else(|| anyhow::anyhow!("reading has no value"))?;
    Ok(Some(format!("{:.2}", value * item_rate(item)?)))
}

fn timeinterval(_: &Item, reading: &Reading) -> anyhow::Result<Option<String>> {
    let (start, stop) = (isoformat(reading.start()), isoformat(reading.stop()));
    Ok(Some(format!("{}/{}", start, stop)))
}

fn hours(_: &Item, reading: &Reading) -> anyhow::Result<Option<String>> {
    let (Some(start), Some(stop)) = (reading.usage_start(), reading.usage_stop()) else {
        return Ok(None);
    };
    let seconds = (stop - start).num_milliseconds() as f64 / 1000.0;
    Ok(Some(seconds_to_hours(seconds)?.to_string()))
}
