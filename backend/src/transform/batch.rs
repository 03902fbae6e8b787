//! Batch orchestration.
//!
//! Maps every row of a file independently through the single-record
//! [`Mapper`] and accounts for the outcome of each one. A failing row, for
//! whatever reason, is recorded and the batch moves on.
//!
//! ```text
//! rows ─▶ [row 0] ─▶ Mapper::map ─▶ classify ─┐
//!         [row 1] ─▶ Mapper::map ─▶ classify ─┼─▶ ordered outcomes ─▶ BatchResult
//!         [row n] ─▶ Mapper::map ─▶ classify ─┘
//! ```
//!
//! Up to `concurrency` rows are in flight at once. Outcomes are consumed in
//! input order, so `mapped_data` follows row order whatever the concurrency.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use uuid::Uuid;

use super::schema::{placeholder_diagnostic, prepare_row, TargetSchema};
use crate::error::RowErrorKind;
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::mapper::{elapsed_ms, Mapper};
use crate::models::{download_url, BatchResult, MappingOutcome, MappingRequest, MappingResult, Record, RowError};

/// Everything needed to map a batch of rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Name of the file the rows came from
    pub file_name: String,
    /// Rows in file order; each should be a JSON object
    pub rows: Vec<Value>,
    pub source_schema: String,
    pub target_schema: String,
    #[serde(default)]
    pub mapping_rules: String,
    #[serde(default)]
    pub target_sample_data: Option<String>,
}

/// Outcome of one row
#[derive(Debug)]
enum RowOutcome {
    Mapped(Record),
    Failed(RowError),
}

/// Maps batches of rows
#[derive(Clone)]
pub struct BatchMapper {
    mapper: Mapper,
    concurrency: usize,
}

impl BatchMapper {
    /// `concurrency` is clamped to at least one row at a time
    pub fn new(mapper: Mapper, concurrency: usize) -> Self {
        Self {
            mapper,
            concurrency: concurrency.max(1),
        }
    }

    /// Map every row. Always returns a result, whatever happens to individual rows.
    pub async fn map_batch(&self, request: BatchRequest) -> BatchResult {
        let started = Instant::now();
        let batch_id = Uuid::new_v4();
        let total = request.rows.len();

        log_info(format!(
            "Starting batch mapping for file: {} with {} rows",
            request.file_name, total
        ));

        let schema = TargetSchema::parse(&request.target_schema);
        let schema = schema.as_ref();
        let request_ref = &request;
        let this = self;

        let outcomes: Vec<RowOutcome> = stream::iter(request.rows.iter().enumerate())
            .map(move |(index, row)| {
                AssertUnwindSafe(this.process_row(index, row, request_ref, schema))
                    .catch_unwind()
                    .map(move |caught| match caught {
                        Ok(outcome) => outcome,
                        Err(panic) => RowOutcome::Failed(RowError {
                            row_index: index,
                            error: format!("Unexpected failure: {}", panic_message(&*panic)),
                            error_type: RowErrorKind::OrchestrationError,
                            cause: None,
                        }),
                    })
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut mapped_data = Vec::new();
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                RowOutcome::Mapped(record) => mapped_data.push(record),
                RowOutcome::Failed(error) => {
                    log_warning(format!("Row {} failed: {}", error.row_index, error.error));
                    errors.push(error);
                }
            }
        }

        let processing_time_ms = elapsed_ms(started);
        log_success(format!(
            "Batch mapping completed: {} successful, {} failed, took {}ms",
            mapped_data.len(),
            errors.len(),
            processing_time_ms
        ));

        BatchResult {
            batch_id,
            file_name: request.file_name,
            total_rows_processed: total,
            successful_mappings: mapped_data.len(),
            failed_mappings: errors.len(),
            mapped_data,
            errors: if errors.is_empty() { None } else { Some(errors) },
            processing_time_ms,
            processed_at: Utc::now(),
            download_url: download_url(&batch_id),
        }
    }

    async fn process_row(
        &self,
        index: usize,
        row: &Value,
        request: &BatchRequest,
        schema: Option<&TargetSchema>,
    ) -> RowOutcome {
        let Some(source_data) = row.as_object() else {
            return RowOutcome::Failed(RowError {
                row_index: index,
                error: format!("Row is not a JSON object: {}", row),
                error_type: RowErrorKind::OrchestrationError,
                cause: None,
            });
        };

        let mapping_request = MappingRequest::new(
            source_data.clone(),
            request.source_schema.as_str(),
            request.target_schema.as_str(),
        )
        .with_rules(request.mapping_rules.as_str())
        .with_target_sample(request.target_sample_data.clone());

        log_info_indent(format!("Mapping row {}", index), 1);
        let result = self.mapper.map(&mapping_request).await;
        classify(index, result, schema)
    }
}

/// Sort a mapper result into a usable row or a row error.
fn classify(index: usize, result: MappingResult, schema: Option<&TargetSchema>) -> RowOutcome {
    match result.outcome {
        MappingOutcome::Success { mapped_data, .. } => match placeholder_diagnostic(&mapped_data) {
            Some(diagnostic) => RowOutcome::Failed(RowError {
                row_index: index,
                error: diagnostic,
                error_type: RowErrorKind::JsonParseError,
                cause: None,
            }),
            None => RowOutcome::Mapped(prepare_row(mapped_data, schema)),
        },
        MappingOutcome::Failed {
            error_message,
            error_kind,
        } => RowOutcome::Failed(RowError {
            row_index: index,
            error: error_message,
            error_type: RowErrorKind::MappingError,
            cause: Some(error_kind),
        }),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
