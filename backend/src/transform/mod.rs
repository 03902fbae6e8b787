//! Batch-level processing of mapped records.
//!
//! - [`schema`]: target-schema allow-list and row clean-up
//! - [`batch`]: drives the single-record mapper over many rows
//! - [`export`]: CSV / JSON rendering of mapped rows

pub mod batch;
pub mod export;
pub mod schema;

pub use batch::{BatchMapper, BatchRequest};
pub use export::{export_csv, export_json, ExportFormat};
pub use schema::{prepare_row, strip_nulls, TargetSchema};
