//! Target schema handling.
//!
//! The target schema is free text, but in practice a JSON object of
//! `field -> type`. When it parses, its keys become an allow-list for the
//! fields kept in mapped rows, in schema order. When it doesn't, rows pass
//! through unfiltered.

use serde_json::Value;

use crate::logs::log_warning;
use crate::models::Record;

/// Ordered allow-list of target fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSchema {
    fields: Vec<String>,
}

impl TargetSchema {
    /// Parse a target schema. Returns `None` (and logs why) when the text is not
    /// a non-empty JSON object. Type names are not inspected.
    pub fn parse(text: &str) -> Option<Self> {
        match serde_json::from_str::<Record>(text) {
            Ok(map) if map.is_empty() => {
                log_warning("Target schema has no fields, output will not be filtered");
                None
            }
            Ok(map) => Some(Self {
                fields: map.keys().cloned().collect(),
            }),
            Err(e) => {
                log_warning(format!(
                    "Target schema is not a JSON object ({}), output will not be filtered",
                    e
                ));
                None
            }
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Keep only schema fields, in schema order.
    pub fn filter(&self, mut record: Record) -> Record {
        self.fields
            .iter()
            .filter_map(|field| record.remove(field).map(|value| (field.clone(), value)))
            .collect()
    }
}

/// Drop top-level fields whose value is `null`.
pub fn strip_nulls(mut record: Record) -> Record {
    record.retain(|_, value| !value.is_null());
    record
}

/// Clean a successfully mapped row: strip nulls, then apply the allow-list if any.
pub fn prepare_row(record: Record, schema: Option<&TargetSchema>) -> Record {
    let record = strip_nulls(record);
    match schema {
        Some(schema) => schema.filter(record),
        None => record,
    }
}

/// Diagnostic for mapped objects that carry no usable data.
pub(crate) fn placeholder_diagnostic(record: &Record) -> Option<String> {
    if record.is_empty() {
        return Some("AI mapping returned an empty object".to_string());
    }
    if record.len() == 1 {
        if let Some(error) = record.get("error") {
            let detail = match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Some(format!("AI mapping returned an error placeholder: {}", detail));
        }
    }
    None
}
