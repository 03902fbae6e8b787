//! Row loading for the command line.
//!
//! CSV files are decoded with encoding and delimiter auto-detection and each
//! row becomes a JSON object of strings keyed by header. JSON files may hold
//! an array of rows or a single row.

use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{ParseError, ParseResult};

/// Rows loaded from a file, with what was detected along the way
#[derive(Debug, Clone)]
pub struct LoadedRows {
    /// Rows in file order
    pub rows: Vec<Value>,
    /// Column headers (CSV only; empty for JSON)
    pub headers: Vec<String>,
    /// Detected encoding (CSV only)
    pub encoding: Option<String>,
    /// Detected delimiter (CSV only)
    pub delimiter: Option<char>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes with the given encoding. Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Pick the separator that occurs most in the header line (`;` on ties or none)
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best = ';';
    let mut best_count = 0;
    for sep in [';', ',', '\t', '|'] {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best = sep;
        }
    }
    best
}

/// Parse CSV text with an explicit delimiter.
///
/// Returns the headers and one object per non-empty line. Missing cells become
/// empty strings; cells beyond the header count are ignored.
pub fn parse_csv(content: &str, delimiter: char) -> ParseResult<(Vec<String>, Vec<Value>)> {
    let delimiter = u8::try_from(delimiter)
        .map_err(|_| ParseError::Csv(format!("delimiter '{}' is not a single byte", delimiter)))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ParseError::Csv(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(ParseError::Csv("Empty CSV file".to_string()));
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ParseError::Csv(format!("line {}: {}", idx + 2, e)))?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let row: Map<String, Value> = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), Value::String(record.get(i).unwrap_or("").to_string())))
            .collect();
        rows.push(Value::Object(row));
    }

    Ok((headers, rows))
}

/// Decode and parse CSV bytes with auto-detection
pub fn parse_csv_bytes(bytes: &[u8]) -> ParseResult<LoadedRows> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let (headers, rows) = parse_csv(&content, delimiter)?;

    Ok(LoadedRows {
        rows,
        headers,
        encoding: Some(encoding),
        delimiter: Some(delimiter),
    })
}

/// Parse JSON text holding an array of objects or a single object
pub fn parse_json_rows(content: &str) -> ParseResult<Vec<Value>> {
    match serde_json::from_str::<Value>(content)? {
        Value::Array(items) => Ok(items),
        object @ Value::Object(_) => Ok(vec![object]),
        other => Err(ParseError::UnsupportedShape(format!(
            "expected an array or an object, found {}",
            other
        ))),
    }
}

/// Load rows from a `.csv` or `.json` file
pub fn load_rows<P: AsRef<Path>>(path: P) -> ParseResult<LoadedRows> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" | "tsv" | "txt" => parse_csv_bytes(&std::fs::read(path)?),
        "json" => {
            let content = std::fs::read_to_string(path)?;
            Ok(LoadedRows {
                rows: parse_json_rows(&content)?,
                headers: Vec::new(),
                encoding: None,
                delimiter: None,
            })
        }
        _ => Err(ParseError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Source schema for CSV input: every column is text
pub fn default_source_schema(headers: &[String]) -> String {
    let schema: Map<String, Value> = headers
        .iter()
        .map(|h| (h.clone(), Value::String("String".to_string())))
        .collect();
    Value::Object(schema).to_string()
}
