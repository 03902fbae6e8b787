//! # Schemamap - AI-assisted record mapping
//!
//! Schemamap maps records from a source schema to a target schema by asking a
//! local language model (Ollama) to do the transformation, then repairing and
//! cleaning whatever text the model sends back.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Request   │────▶│   Prompt    │────▶│  Generate   │────▶│   Repair    │
//! │ (row+schema)│     │  (ai::prompt│     │  (Ollama)   │     │ (fences,    │
//! └─────────────┘     └─────────────┘     └─────────────┘     │  prose, …)  │
//!                                                             └──────┬──────┘
//!                            batch: classify, strip nulls, filter ◀──┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use schemamap::{BatchMapper, BatchRequest, Mapper, MapperConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = MapperConfig::from_env().unwrap();
//!     let mapper = Mapper::from_config(&config).unwrap();
//!     let result = BatchMapper::new(mapper, config.concurrency).map_batch(request).await;
//!     println!("{} rows mapped", result.successful_mappings);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per concern
//! - [`config`] - Environment-backed settings
//! - [`logs`] - Structured log broadcasting
//! - [`models`] - Requests and results
//! - [`ai`] - Prompt building and the generation client
//! - [`repair`] - JSON recovery from model output
//! - [`mapper`] - Single-record mapping
//! - [`transform`] - Batch orchestration, schema filtering, export
//! - [`parser`] - CSV/JSON row loading

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Mapping
pub mod ai;
pub mod mapper;
pub mod repair;
pub mod transform;

// Input
pub mod parser;

// =============================================================================
// Re-exports
// =============================================================================

pub use ai::{mapping_prompt, mapping_rules_prompt, OllamaClient, TextGenerator};
pub use config::MapperConfig;
pub use error::{
    ConfigError, ErrorKind, ExportError, GenerationError, MapError, ParseError, PromptError, RepairError,
    RowErrorKind,
};
pub use mapper::Mapper;
pub use models::{BatchResult, MappingOutcome, MappingRequest, MappingResult, MappingStatus, Record, RowError};
pub use parser::{default_source_schema, load_rows, LoadedRows};
pub use repair::{repair, repair_with, RepairOptions};
pub use transform::{export_csv, export_json, BatchMapper, BatchRequest, ExportFormat, TargetSchema};
