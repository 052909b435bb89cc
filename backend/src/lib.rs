//! # Promoload - promotion export to offer workbooks
//!
//! Promoload reads a promotion export (a spreadsheet or delimited text file
//! with one row per user) and produces three workbooks: user ids grouped by
//! offered percentage, SMS rows with personal offer links grouped by locale,
//! and user ids grouped by requested deposit.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │ Input file  │────▶│   Parser    │────▶│  Resolver   │────▶│  Exporters   │
//! │ (xlsx/csv)  │     │ (auto-fmt)  │     │ (fields)    │     │ (3 workbooks)│
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────────────┘
//!                                                                    │
//!                                      batch driver ◀────────────────┤
//!                                      upload server ◀───────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use promoload::{transform_file, TransformOptions};
//!
//! let output = transform_file("5.xlsx".as_ref(), &TransformOptions::default())?;
//! for (kind, workbook) in output.bundle.iter() {
//!     println!("{}: {} sheets", kind, workbook.sheets().len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Run configuration from env and flags
//! - [`models`] - Cells, rows, datasets and logical fields
//! - [`parser`] - Input reading with format auto-detection
//! - [`transform`] - Resolver, normalizers, offer links, grouping, pipeline
//! - [`export`] - Workbook model and the three exporters
//! - [`driver`] - Batch runs into dated directories
//! - [`api`] - HTTP upload server and live logs

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Export
pub mod export;

// Batch runs
pub mod driver;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, DatasetError, ExportError, OfferError, PipelineError, ResolveError,
    ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{CellValue, Dataset, FieldMapping, LogicalField, Row};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{parse_bytes, parse_file, ParseResult, SourceFormat};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::normalize::{normalize_amount_to_lari, normalize_percent};
pub use transform::offer::{build_offer_url, simple_decrypt, simple_encrypt};
pub use transform::pipeline::{
    transform_bytes, transform_dataset, transform_file, DatasetInfo, PipelineOutput,
    TransformOptions,
};
pub use transform::resolver::{resolve_column, resolve_fields};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{
    export_deposits, export_percentages, export_sms, ExportBundle, ExportKind, Workbook,
};

// =============================================================================
// Re-exports - Driver & config
// =============================================================================

pub use config::RunConfig;
pub use driver::{run_batch, RunContext, RunReport};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
