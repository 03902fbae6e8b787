//! Recover a JSON object from free-form model output.
//!
//! Models are asked for a bare JSON object but routinely wrap it in markdown
//! fences, prefix it with an explanation, append a closing remark, or quote a
//! nested object instead of emitting it inline. The pipeline undoes each of
//! those in turn:
//!
//! ```text
//! raw text ─▶ trim ─▶ strip ``` fences ─▶ balanced-brace scan ─▶ parse ─▶ un-stringify nested JSON
//! ```
//!
//! Every step is a no-op on clean input, so repairing an already valid object
//! returns it unchanged. The pipeline is pure: no I/O besides debug logging.

use serde_json::Value;

use crate::error::{RepairError, RepairResult};
use crate::logs::log_debug;
use crate::models::Record;

/// Knobs for [`repair_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairOptions {
    /// Re-parse string values that look like a JSON object or array.
    ///
    /// Turn this off for targets with free-text fields that may legitimately
    /// hold JSON-looking text; otherwise such text comes back as structure.
    pub unstringify_nested: bool,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self { unstringify_nested: true }
    }
}

/// Repair with default options.
pub fn repair(raw: &str) -> RepairResult<Record> {
    repair_with(raw, RepairOptions::default())
}

/// Extract, parse and clean up the JSON object contained in `raw`.
pub fn repair_with(raw: &str, options: RepairOptions) -> RepairResult<Record> {
    let text = strip_code_fences(raw.trim());
    let candidate = extract_object(text).ok_or(RepairError::NoJsonObject)?;

    let mut record: Record = serde_json::from_str(candidate)?;

    if options.unstringify_nested {
        for (field, value) in record.iter_mut() {
            unstringify(field, value);
        }
    }

    Ok(record)
}

/// Remove a leading ```` ```json ```` / ```` ``` ```` fence and a trailing ```` ``` ```` fence.
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text;
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Locate the first JSON object in `text`.
///
/// Returns the span from the first `{` to its matching `}`, or everything from
/// the first `{` on when the braces never balance. `None` means there is no `{`
/// at all.
pub fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    if start > 0 {
        log_debug("Found text before JSON object, extracting it");
    }

    let tail = &text[start..];
    Some(balanced_prefix(tail).unwrap_or(tail))
}

/// `text` starts with `{`. Braces inside string literals don't count.
fn balanced_prefix(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, byte) in text.bytes().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Replace JSON-looking strings by the structure they encode, at any depth.
fn unstringify(field: &str, value: &mut Value) {
    match value {
        Value::String(text) => {
            if let Some(parsed) = parse_stringified(text) {
                log_debug(format!("Converted stringified nested structure for field {}", field));
                *value = parsed;
                // The decoded structure may itself hold stringified JSON
                unstringify(field, value);
            }
        }
        Value::Object(map) => {
            for (key, nested) in map.iter_mut() {
                unstringify(key, nested);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                unstringify(field, item);
            }
        }
        _ => {}
    }
}

fn parse_stringified(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    let looks_structured = (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'));
    if !looks_structured {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(parsed @ (Value::Object(_) | Value::Array(_))) => Some(parsed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_plain_object() {
        assert_eq!(repair(r#"{"field":"value"}"#).unwrap(), record(json!({"field": "value"})));
    }

    #[test]
    fn test_json_fence_is_transparent() {
        let plain = r#"{"name": "Desk", "tags": ["oak"]}"#;
        let fenced = format!("```json\n{}\n```", plain);
        let bare_fence = format!("```\n{}\n```", plain);

        let expected = repair(plain).unwrap();
        assert_eq!(repair(&fenced).unwrap(), expected);
        assert_eq!(repair(&bare_fence).unwrap(), expected);
    }

    #[test]
    fn test_surrounding_prose() {
        let raw = r#"Here is the result: {"a":1,"b":{"c":2}} Thanks!"#;
        assert_eq!(extract_object(raw), Some(r#"{"a":1,"b":{"c":2}}"#));
        assert_eq!(repair(raw).unwrap(), record(json!({"a": 1, "b": {"c": 2}})));
    }

    #[test]
    fn test_trailing_prose_after_leading_object() {
        let raw = "{\"a\":1}\n\nLet me know if you need anything else.";
        assert_eq!(repair(raw).unwrap(), record(json!({"a": 1})));
    }

    #[test]
    fn test_braces_inside_strings_do_not_unbalance() {
        let raw = r#"Sure: {"note":"use } carefully","x":{"y":"{"}} bye"#;
        let repaired = repair(raw).unwrap();
        assert_eq!(repaired["note"], "use } carefully");
        assert_eq!(repaired["x"]["y"], "{");
    }

    #[test]
    fn test_unbalanced_falls_back_to_tail() {
        let raw = r#"Result: {"a": {"b": 1}"#;
        assert_eq!(extract_object(raw), Some(r#"{"a": {"b": 1}"#));
        assert!(matches!(repair(raw), Err(RepairError::InvalidJson(_))));
    }

    #[test]
    fn test_stringified_nested_object() {
        let raw = r#"{"dimensions":"{\"length\":30,\"width\":25}"}"#;
        let repaired = repair(raw).unwrap();
        assert_eq!(repaired["dimensions"], json!({"length": 30, "width": 25}));
    }

    #[test]
    fn test_stringified_array_and_multi_level() {
        let raw = r#"{"tags":"[\"a\",\"b\"]","outer":{"inner":"{\"deep\":\"[1,2]\"}"}}"#;
        let repaired = repair(raw).unwrap();
        assert_eq!(repaired["tags"], json!(["a", "b"]));
        assert_eq!(repaired["outer"]["inner"], json!({"deep": [1, 2]}));
    }

    #[test]
    fn test_unparsable_lookalike_left_alone() {
        let raw = r#"{"dimensions":"{ 'length': '30' }","label":"[draft]"}"#;
        let repaired = repair(raw).unwrap();
        assert_eq!(repaired["dimensions"], "{ 'length': '30' }");
        assert_eq!(repaired["label"], "[draft]");
    }

    #[test]
    fn test_unstringify_can_be_disabled() {
        let raw = r#"{"template":"{\"x\":1}"}"#;
        let options = RepairOptions { unstringify_nested: false };
        assert_eq!(repair_with(raw, options).unwrap()["template"], "{\"x\":1}");
    }

    #[test]
    fn test_no_brace_is_no_json_object() {
        assert!(matches!(repair("I could not map this record."), Err(RepairError::NoJsonObject)));
        assert!(matches!(repair("   \n\t "), Err(RepairError::NoJsonObject)));
        assert!(matches!(repair(""), Err(RepairError::NoJsonObject)));
    }

    #[test]
    fn test_malformed_candidate_surfaces_parse_error() {
        let err = repair("{'single': 'quotes'}").unwrap_err();
        assert!(matches!(err, RepairError::InvalidJson(_)));
        assert!(err.to_string().starts_with("AI mapping returned invalid JSON:"));
    }

    #[test]
    fn test_empty_object_is_valid() {
        assert!(repair("{}").unwrap().is_empty());
    }

    #[test]
    fn test_idempotent_on_clean_input() {
        let raw = r#"Output:
```json
{"id": 7, "specs": "{\"weight\": 2.5}", "tags": ["x", "y"], "missing": null}
```"#;
        let once = repair(raw).unwrap();
        let again = repair(&serde_json::to_string(&once).unwrap()).unwrap();
        assert_eq!(once, again);
    }

    #[test]
    fn test_key_order_preserved() {
        let repaired = repair(r#"{"z":1,"a":2,"m":3}"#).unwrap();
        let keys: Vec<&str> = repaired.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
