//! Full pipeline: rows from a file, prompts over HTTP, repaired and filtered output.

mod common;

use axum::http::StatusCode;
use common::{closed_port, envelope, generate_route, spawn};
use schemamap::{
    export_csv, load_rows, BatchMapper, BatchRequest, ErrorKind, Mapper, MapperConfig, RowErrorKind,
};
use serde_json::{json, Value};

const TARGET_SCHEMA: &str = r#"{"name":"String","sku":"String","dimensions":"Object"}"#;

/// Answers in the shapes models actually produce, keyed on the row in the prompt.
async fn fake_model() -> String {
    spawn(generate_route(|body: Value| async move {
        let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
        let text = if prompt.contains(r#""sku":"D-1""#) {
            "```json\n{\"name\": \"Desk\", \"sku\": \"D-1\", \"dimensions\": \"{\\\"w\\\": 120}\", \"note\": \"x\"}\n```"
        } else if prompt.contains(r#""sku":"C-2""#) {
            "Here is the mapped record:\n{\"sku\": \"C-2\", \"name\": \"Chair\", \"dimensions\": null}\nHope this helps!"
        } else if prompt.contains(r#""sku":"X-3""#) {
            "I could not find any matching fields."
        } else {
            "{}"
        };
        (StatusCode::OK, envelope(text))
    }))
    .await
}

fn request(rows: Vec<Value>) -> BatchRequest {
    BatchRequest {
        file_name: "products.csv".to_string(),
        rows,
        source_schema: r#"{"sku":"String","title":"String"}"#.to_string(),
        target_schema: TARGET_SCHEMA.to_string(),
        mapping_rules: "Map title to name\nMap sku to sku".to_string(),
        target_sample_data: None,
    }
}

fn batch_mapper(host: &str, concurrency: usize) -> BatchMapper {
    let config = MapperConfig::default().with_host(host);
    BatchMapper::new(Mapper::from_config(&config).unwrap(), concurrency)
}

#[tokio::test]
async fn test_csv_file_through_fake_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.csv");
    std::fs::write(&path, "sku;title\nD-1;Desk\nC-2;Chair\nX-3;Mystery\nZ-9;Nothing\n").unwrap();
    let loaded = load_rows(&path).unwrap();

    let host = fake_model().await;
    let result = batch_mapper(&host, 2).map_batch(request(loaded.rows)).await;

    assert_eq!(result.total_rows_processed, 4);
    assert_eq!(result.successful_mappings, 2);
    assert_eq!(result.failed_mappings, 2);

    assert_eq!(
        Value::Object(result.mapped_data[0].clone()),
        json!({"name": "Desk", "sku": "D-1", "dimensions": {"w": 120}})
    );
    assert_eq!(Value::Object(result.mapped_data[1].clone()), json!({"name": "Chair", "sku": "C-2"}));

    let errors = result.errors.as_ref().unwrap();
    assert_eq!(errors[0].row_index, 2);
    assert_eq!(errors[0].error_type, RowErrorKind::MappingError);
    assert_eq!(errors[0].cause, Some(ErrorKind::Parse));
    assert_eq!(errors[1].row_index, 3);
    assert_eq!(errors[1].error_type, RowErrorKind::JsonParseError);

    let csv = export_csv(&result.mapped_data).unwrap();
    assert_eq!(
        csv.lines().next().unwrap(),
        r#""name","sku","dimensions""#
    );
}

#[tokio::test]
async fn test_service_down_fails_every_row() {
    let host = closed_port().await;
    let rows = vec![json!({"sku": "A"}), json!({"sku": "B"}), json!({"sku": "C"})];

    let result = batch_mapper(&host, 1).map_batch(request(rows)).await;

    assert_eq!(result.total_rows_processed, 3);
    assert_eq!(result.successful_mappings, 0);
    assert_eq!(result.failed_mappings, 3);
    assert!(result.mapped_data.is_empty());

    let errors = result.errors.unwrap();
    for (expected, error) in errors.iter().enumerate() {
        assert_eq!(error.row_index, expected);
        assert_eq!(error.error_type, RowErrorKind::MappingError);
        assert_eq!(error.cause, Some(ErrorKind::Transport));
        assert!(error.error.contains("ollama pull mistral"));
    }
}

#[tokio::test]
async fn test_batch_result_wire_format() {
    let host = fake_model().await;
    let result = batch_mapper(&host, 1)
        .map_batch(request(vec![json!({"sku": "D-1"}), json!({"sku": "Z-9"})]))
        .await;

    let wire = serde_json::to_value(&result).unwrap();
    assert_eq!(wire["total_rows_processed"], 2);
    assert_eq!(wire["errors"][0]["error_type"], "JSON_PARSE_ERROR");
    assert_eq!(
        wire["download_url"],
        format!("/api/mapping/batch/{}/download", result.batch_id)
    );
}
