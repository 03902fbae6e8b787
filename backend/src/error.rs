//! Error types for the schemamap mapping pipeline.
//!
//! One enum per stage of the pipeline:
//!
//! - [`PromptError`] - Prompt rendering errors
//! - [`GenerationError`] - Generation endpoint errors
//! - [`RepairError`] - Model output repair errors
//! - [`MapError`] - Everything that can fail a single mapping attempt
//! - [`ConfigError`] - Environment configuration errors
//! - [`ParseError`] / [`ExportError`] - CLI-side file loading and export
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Prompt Errors
// =============================================================================

/// Errors while rendering a prompt.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Source data could not be serialized to JSON.
    #[error("Failed to encode source data: {0}")]
    Encoding(#[from] serde_json::Error),
}

// =============================================================================
// Generation Errors
// =============================================================================

/// Errors from the text-generation endpoint.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Endpoint unreachable, refused, timed out or answered with an HTTP error.
    #[error(
        "Generation service is unavailable at {url}. Ensure the service is running and the model '{model}' is downloaded. Run 'ollama pull {model}' to download the model. Cause: {reason}"
    )]
    Unavailable {
        url: String,
        model: String,
        reason: String,
    },

    /// Endpoint answered, but not with a usable envelope.
    #[error("Invalid response from generation service: {0}")]
    InvalidResponse(String),
}

// =============================================================================
// Repair Errors
// =============================================================================

/// Errors while extracting a JSON object from model output.
#[derive(Debug, Error)]
pub enum RepairError {
    /// No `{` anywhere in the response.
    #[error("AI mapping returned invalid JSON: no JSON object found in response")]
    NoJsonObject,

    /// A candidate object was found but does not parse.
    #[error("AI mapping returned invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

// =============================================================================
// Mapping Errors
// =============================================================================

/// Any failure of a single mapping attempt.
#[derive(Debug, Error)]
pub enum MapError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Repair(#[from] RepairError),
}

impl MapError {
    /// Classify this error for result records.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MapError::Prompt(_) => ErrorKind::Encoding,
            MapError::Generation(GenerationError::Unavailable { .. }) => ErrorKind::Transport,
            MapError::Generation(GenerationError::InvalidResponse(_)) => ErrorKind::InvalidResponse,
            MapError::Repair(_) => ErrorKind::Parse,
        }
    }
}

/// Failure category of a mapping attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Source data could not be serialized.
    Encoding,
    /// Endpoint unreachable or timed out.
    Transport,
    /// Endpoint reachable but the envelope was unusable.
    InvalidResponse,
    /// No recoverable JSON object in the model output.
    Parse,
}

/// Failure category of a batch row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowErrorKind {
    /// The single-record mapper returned FAILED.
    MappingError,
    /// The mapper succeeded but produced an empty or placeholder object.
    JsonParseError,
    /// Anything else that went wrong while preparing or classifying the row.
    OrchestrationError,
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds a value of the wrong shape.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

// =============================================================================
// File Loading Errors
// =============================================================================

/// Errors while loading rows from a file.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid CSV content.
    #[error("Invalid CSV: {0}")]
    Csv(String),

    /// Invalid JSON content.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON is valid but not an object or array of objects.
    #[error("Unsupported JSON shape: {0}")]
    UnsupportedShape(String),

    /// File extension is not one we load.
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while exporting mapped rows.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Export buffer error: {0}")]
    Buffer(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for generation calls.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Result type for repair operations.
pub type RepairResult<T> = Result<T, RepairError>;

/// Result type for mapping operations.
pub type MapResult<T> = Result<T, MapError>;

/// Result type for file loading.
pub type ParseResult<T> = Result<T, ParseError>;
