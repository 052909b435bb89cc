//! High-level pipeline API: table in, three workbooks out.
//!
//! Both the batch driver and the upload server go through this module, so
//! the two entry points make exactly the same data decisions.
//!
//! ```text
//! dataset ──▶ resolve fields (once) ──┬──▶ percentages roster
//!                                     ├──▶ SMS sheet (offer links)
//!                                     └──▶ deposit roster
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use promoload::{transform_file, TransformOptions};
//!
//! let output = transform_file("promo.xlsx".as_ref(), &TransformOptions::default())?;
//! println!("{} SMS sheets", output.bundle.sms.sheets().len());
//! ```

use serde::Serialize;
use std::path::Path;

use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::PipelineResult;
use crate::export::percentages::UNKNOWN_PERCENT_SHEET;
use crate::export::{export_deposits, export_percentages, export_sms, ExportBundle};
use crate::models::{Dataset, FieldMapping, LogicalField};
use crate::parser::{parse_bytes, parse_file, ParseResult, SourceFormat};
use crate::transform::normalize::percent_number;
use crate::transform::offer::DEFAULT_KEY;
use crate::transform::resolver::resolve_fields;

/// Options for the transformation pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformOptions {
    /// Shift for the offer link obfuscation.
    pub key: u32,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self { key: DEFAULT_KEY }
    }
}

/// Input table information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfo {
    pub format: SourceFormat,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub info: DatasetInfo,
    pub mapping: FieldMapping,
    pub bundle: ExportBundle,
}

/// Resolve the fields of `dataset` once and build all three workbooks.
///
/// Fails only when a required field has no column; cell-level problems
/// show up as blank cells in the output.
pub fn transform_dataset(
    dataset: &Dataset,
    options: &TransformOptions,
) -> PipelineResult<(FieldMapping, ExportBundle)> {
    let mapping = resolve_fields(&dataset.headers)?;
    for warning in row_warnings(dataset, &mapping) {
        log_warning(warning);
    }

    log_info("📊 Building percentage roster...");
    let percentages = export_percentages(dataset, &mapping);
    log_success(format!(
        "{} sheet(s), {} row(s)",
        percentages.sheets().len(),
        percentages.body_rows()
    ));

    log_info("✉️  Building SMS sheet...");
    let sms = export_sms(dataset, &mapping, options.key);
    log_success(format!("{} sheet(s), {} row(s)", sms.sheets().len(), sms.body_rows()));

    log_info("💰 Building deposit roster...");
    let deposits = export_deposits(dataset, &mapping);
    log_success(format!(
        "{} sheet(s), {} row(s)",
        deposits.sheets().len(),
        deposits.body_rows()
    ));

    Ok((
        mapping,
        ExportBundle {
            percentages,
            sms,
            deposits,
        },
    ))
}

/// Rows that still export but land in a fallback sheet or are left out.
fn row_warnings(dataset: &Dataset, mapping: &FieldMapping) -> Vec<String> {
    let (mut no_percent, mut no_locale, mut no_user) = (0, 0, 0);
    for row in &dataset.rows {
        if percent_number(mapping.get(row, LogicalField::Percent)).is_none() {
            no_percent += 1;
        }
        if mapping.get(row, LogicalField::Locale).is_empty() {
            no_locale += 1;
        }
        if mapping.get(row, LogicalField::UserId).to_string().trim().is_empty() {
            no_user += 1;
        }
    }

    let mut warnings = Vec::new();
    if no_percent > 0 {
        warnings.push(format!(
            "{} row(s) without a readable percent go to '{}'",
            no_percent, UNKNOWN_PERCENT_SHEET
        ));
    }
    if no_locale > 0 {
        warnings.push(format!("{} row(s) without a locale", no_locale));
    }
    if no_user > 0 {
        warnings.push(format!("{} row(s) without a user id are left off the deposit roster", no_user));
    }
    warnings
}

/// Run the pipeline on a file.
pub fn transform_file(path: &Path, options: &TransformOptions) -> PipelineResult<PipelineOutput> {
    log_info(format!("📖 Reading {}...", path.display()));
    let parse_result = parse_file(path)?;
    transform_parsed(parse_result, options)
}

/// Run the pipeline on uploaded bytes.
pub fn transform_bytes(bytes: &[u8], options: &TransformOptions) -> PipelineResult<PipelineOutput> {
    log_info(format!("📖 Reading upload ({} bytes)...", bytes.len()));
    let parse_result = parse_bytes(bytes)?;
    transform_parsed(parse_result, options)
}

fn transform_parsed(parse_result: ParseResult, options: &TransformOptions) -> PipelineResult<PipelineOutput> {
    let ParseResult { dataset, format } = parse_result;

    match &format {
        SourceFormat::Delimited { encoding, delimiter } => {
            log_success(format!("Detected encoding: {}", encoding));
            log_success(format!("Detected separator: '{}'", format_delimiter(*delimiter)));
        }
        SourceFormat::Workbook { sheet } => {
            log_success(format!("Read worksheet: {}", sheet));
        }
    }
    log_success(format!("Read {} rows, {} columns", dataset.len(), dataset.headers.len()));

    let (mapping, bundle) = transform_dataset(&dataset, options)?;

    Ok(PipelineOutput {
        info: DatasetInfo {
            format,
            headers: dataset.headers,
            row_count: dataset.rows.len(),
        },
        mapping,
        bundle,
    })
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}
