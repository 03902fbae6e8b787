//! Prompt generation for record mapping
//!
//! Renders the instruction text sent to the model. Rendering is deterministic:
//! the same request always yields the same prompt.

use crate::error::PromptError;
use crate::models::MappingRequest;

/// Output-format instructions appended to every mapping prompt
const FORMAT_INSTRUCTIONS: &str = r#"INSTRUCTIONS FOR JSON GENERATION:
1. Return ONLY a valid JSON object that EXACTLY matches the target schema structure
2. Start with { and end with } - no text before or after
3. IMPORTANT: Preserve data types from SOURCE SCHEMA when mapping:
   - If a source field is a "List" type, map it as a JSON array [] even if the target name is different
   - If the source is an array/list, the mapped target MUST also be an array
   - Example: if "categories" is a List, "category" must be ["value1","value2"], NOT "value1,value2"
4. CRITICAL FOR COMPLEX TYPES - Handle nested objects correctly:
   - NEVER stringify objects or arrays - return them as proper JSON structures
   - If the source has a nested object like {length: 30, width: 25}, return it as {"length": 30, "width": 25}
   - WRONG: "dimensions": "{ \"length\": 30, \"width\": 25 }"
   - CORRECT: "dimensions": {"length": 30, "width": 25}
   - NEVER wrap objects or arrays in quotes
5. If a TARGET SAMPLE DATA section is present, match the structure and types it shows
6. Numbers stay numbers, arrays stay arrays, objects stay objects
7. Do NOT include any markdown code blocks (no ``` or ~~~)
8. Do NOT include any comments (no // or /* */)
9. Do NOT include ANY explanation, introduction, or description text
10. Use double quotes for all JSON strings, never single quotes
11. Ensure all JSON braces and brackets are properly closed
12. If a value is missing or cannot be determined, omit the field or use null - never invent a value

Transform the source data according to the target schema and mapping rules.
Return ONLY: {the JSON object}"#;

/// Build the prompt that asks the model to map one record.
///
/// Fails only when the source data cannot be serialized.
pub fn mapping_prompt(request: &MappingRequest) -> Result<String, PromptError> {
    let source_data = serde_json::to_string(&request.source_data)?;
    let source_schema = &request.source_schema;
    let target_schema = &request.target_schema;
    let mapping_rules = &request.mapping_rules;

    let target_sample_section = match &request.target_sample_data {
        Some(sample) => format!("\nTARGET SAMPLE DATA (structure example):\n{sample}\n"),
        None => String::new(),
    };

    Ok(format!(
        r#"CRITICAL: Return ONLY a JSON object. Do NOT include any introduction, explanation, text, or commentary. Start directly with {{ and end with }}.

You are a data mapping expert. Map the following source data to the target schema.

SOURCE SCHEMA (note the data types):
{source_schema}

TARGET SCHEMA:
{target_schema}
{target_sample_section}
SOURCE DATA:
{source_data}

MAPPING RULES:
{mapping_rules}

{FORMAT_INSTRUCTIONS}"#
    ))
}

/// Build the prompt that asks the model to propose mapping rules.
pub fn mapping_rules_prompt(source_schema: &str, target_schema: &str) -> String {
    format!(
        r#"You are a data mapping expert. Analyze the source and target schemas, and generate mapping rules.

SOURCE SCHEMA:
{source_schema}

TARGET SCHEMA:
{target_schema}

Generate mapping rules in the following format (one rule per line):
- Map [source_field] to [target_field]

IMPORTANT RULES:
1. Only include fields that have EXACT NAME MATCHES between source and target
2. Do NOT map fields with similar but different names (e.g. 'source_amount' to 'amount' is NOT allowed)
3. For fields in TARGET that don't have exact source matches, do NOT include them in the rules
4. Unmapped target fields will be configured separately
5. Only output the mapping rules, nothing else - no explanations or comments"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> MappingRequest {
        let data = json!({"product_name": "Desk", "tags": ["oak", "large"], "price": 120.5});
        MappingRequest::new(
            data.as_object().cloned().unwrap(),
            r#"{"product_name":"String","tags":"List","price":"BigDecimal"}"#,
            r#"{"name":"String","labels":"List","amount":"BigDecimal"}"#,
        )
        .with_rules("Map product_name to name\nMap tags to labels")
    }

    #[test]
    fn test_prompt_contains_inputs_verbatim() {
        let prompt = mapping_prompt(&request()).unwrap();

        assert!(prompt.contains(r#"{"product_name":"String","tags":"List","price":"BigDecimal"}"#));
        assert!(prompt.contains(r#"{"name":"String","labels":"List","amount":"BigDecimal"}"#));
        assert!(prompt.contains(r#"{"product_name":"Desk","tags":["oak","large"],"price":120.5}"#));
        assert!(prompt.contains("Map product_name to name\nMap tags to labels"));
        assert!(prompt.ends_with(FORMAT_INSTRUCTIONS));
    }

    #[test]
    fn test_sample_section_only_when_present() {
        let without = mapping_prompt(&request()).unwrap();
        assert!(!without.contains("TARGET SAMPLE DATA (structure example)"));

        let with = mapping_prompt(
            &request().with_target_sample(Some(r#"{"name":"Chair","labels":["x"]}"#.into())),
        )
        .unwrap();
        assert!(with.contains("TARGET SAMPLE DATA (structure example):\n{\"name\":\"Chair\",\"labels\":[\"x\"]}"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(mapping_prompt(&request()).unwrap(), mapping_prompt(&request()).unwrap());
    }

    #[test]
    fn test_format_instructions_cover_output_rules() {
        assert!(FORMAT_INSTRUCTIONS.contains("Start with { and end with }"));
        assert!(FORMAT_INSTRUCTIONS.contains("markdown code blocks"));
        assert!(FORMAT_INSTRUCTIONS.contains("comments"));
        assert!(FORMAT_INSTRUCTIONS.contains("double quotes"));
        assert!(FORMAT_INSTRUCTIONS.contains("MUST also be an array"));
        assert!(FORMAT_INSTRUCTIONS.contains("NEVER stringify objects or arrays"));
        assert!(FORMAT_INSTRUCTIONS.contains("omit the field or use null"));
    }

    #[test]
    fn test_rules_prompt_includes_schemas() {
        let prompt = mapping_rules_prompt("{\"sku\":\"String\"}", "{\"sku\":\"String\"}");
        assert!(prompt.contains("SOURCE SCHEMA:\n{\"sku\":\"String\"}"));
        assert!(prompt.contains("- Map [source_field] to [target_field]"));
    }
}
