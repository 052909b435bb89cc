//! Error types for the promotion export pipeline.
//!
//! - [`DatasetError`] - Reading the input table
//! - [`ResolveError`] - Binding logical fields to columns
//! - [`OfferError`] - Decoding offer link parameters
//! - [`ExportError`] - Serializing workbooks
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ConfigError`] - Environment and flag values
//! - [`ServerError`] - Upload API failures
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Unparseable cell values are never errors: the normalizers degrade them
//! to blank labels so a single bad cell cannot abort a run.

use thiserror::Error;

use crate::models::LogicalField;

// =============================================================================
// Dataset Errors
// =============================================================================

/// Errors while reading the input table.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed delimited text.
    #[error("Invalid delimited text at line {line}: {message}")]
    Parse { line: u64, message: String },

    /// Spreadsheet container could not be read.
    #[error("Invalid workbook: {0}")]
    Workbook(String),

    /// Empty file.
    #[error("Input file is empty")]
    EmptyFile,

    /// No header row.
    #[error("No headers found in input")]
    NoHeaders,

    /// Extension the reader does not know.
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),
}

impl From<calamine::Error> for DatasetError {
    fn from(e: calamine::Error) -> Self {
        DatasetError::Workbook(e.to_string())
    }
}

// =============================================================================
// Resolution Errors
// =============================================================================

/// Errors while binding logical fields to the input's headers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No header matched any candidate.
    #[error("Missing column: none of {candidates:?} matched")]
    MissingColumn { candidates: Vec<String> },

    /// A required logical field could not be bound.
    #[error("Missing column for field '{field}': tried {candidates:?}")]
    MissingField {
        field: LogicalField,
        candidates: Vec<String>,
    },
}

// =============================================================================
// Offer Link Errors
// =============================================================================

/// Errors from decoding an obfuscated offer parameter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OfferError {
    /// A hyphen-separated field is not hexadecimal.
    #[error("Segment {index} is not hexadecimal: '{segment}'")]
    InvalidHex { index: usize, segment: String },

    /// A field decodes below zero or outside the Unicode range.
    #[error("Segment {index} does not decode to a character with this key")]
    InvalidCodePoint { index: usize },
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while serializing or writing workbooks.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Spreadsheet writer failure.
    #[error("Workbook serialization failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// IO error.
    #[error("Failed to write workbook: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::transform::pipeline`]
/// and the batch driver.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input could not be read.
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// A required field is missing; nothing is written.
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    /// Workbook serialization or write failure.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

// =============================================================================
// Config Errors
// =============================================================================

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable holds an unusable value.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Unknown job or workbook kind.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for dataset reading.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Result type for column resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Result type for workbook export.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
