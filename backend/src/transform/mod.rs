//! Transformation module.
//!
//! Everything between a parsed table and the finished workbooks:
//! - Resolver: header names to logical fields
//! - Normalize: percent and amount labels
//! - Offer: obfuscated personal offer links
//! - Grouper: rows to per-group sheets
//! - Pipeline: resolve once, run all exporters

pub mod grouper;
pub mod normalize;
pub mod offer;
pub mod pipeline;
pub mod resolver;

pub use grouper::{group_rows, grouped_workbook, sanitize_sheet, GroupKey, SheetPolicy};
pub use normalize::{normalize_amount_to_lari, normalize_percent, percent_label, percent_number};
pub use offer::{build_offer_url, simple_decrypt, simple_encrypt, DEFAULT_KEY};
pub use pipeline::*;
pub use resolver::{canonize, resolve_column, resolve_fields};
