//! Domain models for the mapping pipeline.
//!
//! - [`MappingRequest`] - One record plus everything the model needs to map it
//! - [`MappingResult`] - Outcome of one mapping attempt
//! - [`MappingOutcome`] - Success (mapped data) or failure (error detail), never both
//! - [`BatchResult`] - Aggregate outcome of a batch
//! - [`RowError`] - One failed batch row

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::error::{ErrorKind, MapError, RowErrorKind};

/// A JSON object: field name to value, insertion-ordered.
pub type Record = Map<String, Value>;

// =============================================================================
// Mapping Request
// =============================================================================

/// Input of a single mapping attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRequest {
    /// The record to map
    pub source_data: Record,
    /// Text description of the source fields and their types
    pub source_schema: String,
    /// Text description of the target fields (usually a JSON object of field -> type)
    pub target_schema: String,
    /// Example instance of the target shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sample_data: Option<String>,
    /// Line-oriented directives ("Map X to Y")
    #[serde(default)]
    pub mapping_rules: String,
}

impl MappingRequest {
    pub fn new(
        source_data: Record,
        source_schema: impl Into<String>,
        target_schema: impl Into<String>,
    ) -> Self {
        Self {
            source_data,
            source_schema: source_schema.into(),
            target_schema: target_schema.into(),
            target_sample_data: None,
            mapping_rules: String::new(),
        }
    }

    pub fn with_rules(mut self, rules: impl Into<String>) -> Self {
        self.mapping_rules = rules.into();
        self
    }

    /// Attach a target sample. Blank samples are treated as absent.
    pub fn with_target_sample(mut self, sample: Option<String>) -> Self {
        self.target_sample_data = sample.filter(|s| !s.trim().is_empty());
        self
    }
}

// =============================================================================
// Mapping Result
// =============================================================================

/// Status of a mapping attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingStatus {
    Success,
    Failed,
}

impl fmt::Display for MappingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingStatus::Success => write!(f, "SUCCESS"),
            MappingStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// What a mapping attempt produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MappingOutcome {
    Success {
        /// Repaired model output
        mapped_data: Record,
        /// Raw model output, kept for audit
        transformation_details: String,
    },
    Failed {
        /// Human-readable message of the failing step
        error_message: String,
        /// Which step failed
        error_kind: ErrorKind,
    },
}

impl From<MapError> for MappingOutcome {
    fn from(err: MapError) -> Self {
        MappingOutcome::Failed {
            error_kind: err.kind(),
            error_message: err.to_string(),
        }
    }
}

/// Terminal result of one mapping attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    /// Generated before any work starts, so failures stay traceable
    pub mapping_id: Uuid,
    #[serde(flatten)]
    pub outcome: MappingOutcome,
    pub processed_at: DateTime<Utc>,
    pub execution_time_ms: u64,
}

impl MappingResult {
    pub fn status(&self) -> MappingStatus {
        match self.outcome {
            MappingOutcome::Success { .. } => MappingStatus::Success,
            MappingOutcome::Failed { .. } => MappingStatus::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == MappingStatus::Success
    }

    pub fn mapped_data(&self) -> Option<&Record> {
        match &self.outcome {
            MappingOutcome::Success { mapped_data, .. } => Some(mapped_data),
            MappingOutcome::Failed { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            MappingOutcome::Failed { error_message, .. } => Some(error_message),
            MappingOutcome::Success { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.outcome {
            MappingOutcome::Failed { error_kind, .. } => Some(*error_kind),
            MappingOutcome::Success { .. } => None,
        }
    }
}

// =============================================================================
// Batch Result
// =============================================================================

/// A failed batch row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    /// Position of the row in the input
    pub row_index: usize,
    pub error: String,
    pub error_type: RowErrorKind,
    /// Mapper-level classification, when the mapper produced the failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<ErrorKind>,
}

/// Aggregate outcome of a batch run.
///
/// `successful_mappings + failed_mappings == total_rows_processed` and
/// `errors` is `None` when nothing failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_id: Uuid,
    pub file_name: String,
    pub total_rows_processed: usize,
    pub successful_mappings: usize,
    pub failed_mappings: usize,
    /// Successful rows only, in input order
    pub mapped_data: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<RowError>>,
    pub processing_time_ms: u64,
    pub processed_at: DateTime<Utc>,
    pub download_url: String,
}

/// Download location of a batch's results.
pub fn download_url(batch_id: &Uuid) -> String {
    format!("/api/mapping/batch/{}/download", batch_id)
}
