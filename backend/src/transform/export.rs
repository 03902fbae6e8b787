//! Export mapped rows as JSON or CSV.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::error::ExportError;
use crate::models::Record;

/// Output format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("Unknown export format '{}' (expected json or csv)", other)),
        }
    }
}

/// Render rows in the given format
pub fn export(rows: &[Record], format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => export_json(rows),
        ExportFormat::Csv => export_csv(rows),
    }
}

/// Pretty-printed JSON array
pub fn export_json(rows: &[Record]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(rows)?)
}

/// CSV with the first row's keys as header. Every cell is quoted; nested
/// values are written as compact JSON.
pub fn export_csv(rows: &[Record]) -> Result<String, ExportError> {
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };
    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&headers)?;
    for row in rows {
        writer.write_record(headers.iter().map(|h| cell(row.get(*h))))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
