//! Domain models for the promotion export pipeline.
//!
//! - [`CellValue`] - A raw spreadsheet cell (text, number, bool, or empty)
//! - [`Row`] / [`Dataset`] - Ordered rows keyed by the literal source headers
//! - [`LogicalField`] - The abstract roles the exporters read
//! - [`FieldMapping`] - Logical field to resolved column, fixed for one run

use serde::{Serialize, Serializer};
use std::fmt;

// =============================================================================
// Cell values
// =============================================================================

/// A raw cell as it was read from the input file.
///
/// Nothing is normalized here; exporters copy raw values through as-is
/// wherever the output does not call for a canonical label.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Build a cell from text, treating the empty string as a missing value.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// `None` for a missing cell, the rendered text otherwise.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            other => Some(other.to_string()),
        }
    }

    /// Rendered text, `""` when the cell is missing.
    pub fn text_or_blank(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => f.write_str(&format_number(*n)),
            CellValue::Bool(true) => f.write_str("True"),
            CellValue::Bool(false) => f.write_str("False"),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// Whole numbers render without a fractional part (`100`, not `100.0`).
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// One input record, cells aligned with [`Dataset::headers`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<CellValue>,
}

impl Row {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Cell at `index`, `Empty` when the row is shorter than the header.
    pub fn get(&self, index: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells.get(index).unwrap_or(&EMPTY)
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }
}

/// Ordered rows with unique headers, exactly as read from the source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// Logical fields
// =============================================================================

/// Abstract roles the exporters need, decoupled from header spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalField {
    UserId,
    Nickname,
    Phone,
    Percent,
    Locale,
    RequestedDeposit,
    CoinReward,
}

impl LogicalField {
    pub const ALL: [LogicalField; 7] = [
        LogicalField::UserId,
        LogicalField::Nickname,
        LogicalField::Phone,
        LogicalField::Percent,
        LogicalField::Locale,
        LogicalField::RequestedDeposit,
        LogicalField::CoinReward,
    ];

    /// Canonical field name.
    pub fn name(self) -> &'static str {
        match self {
            LogicalField::UserId => "userid",
            LogicalField::Nickname => "nickname",
            LogicalField::Phone => "phone",
            LogicalField::Percent => "percent",
            LogicalField::Locale => "locale",
            LogicalField::RequestedDeposit => "requested_deposit",
            LogicalField::CoinReward => "coin_reward",
        }
    }

    /// Header names tried by the resolver, highest priority first.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            LogicalField::UserId => &["userid"],
            LogicalField::Nickname => &["nickname"],
            LogicalField::Phone => &["phone"],
            LogicalField::Percent => &["percentages", "percentage"],
            LogicalField::Locale => &["localecode", "locale"],
            LogicalField::RequestedDeposit => &["requested_dep", "requesteddeposit", "requested"],
            LogicalField::CoinReward => &["coin_reward_value", "coin_reward"],
        }
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Field mapping
// =============================================================================

/// A resolved column: its position in the row and its literal header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumn {
    pub index: usize,
    pub header: String,
}

/// Logical field to column binding, computed once per run and never changed.
///
/// Built by [`crate::transform::resolver::resolve_fields`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    // One entry per `LogicalField::ALL`, in that order.
    columns: Vec<ResolvedColumn>,
}

impl FieldMapping {
    pub(crate) fn from_columns(columns: Vec<ResolvedColumn>) -> Self {
        debug_assert_eq!(columns.len(), LogicalField::ALL.len());
        Self { columns }
    }

    pub fn column(&self, field: LogicalField) -> &ResolvedColumn {
        &self.columns[field as usize]
    }

    pub fn header(&self, field: LogicalField) -> &str {
        &self.column(field).header
    }

    /// Raw cell for `field` in `row`.
    pub fn get<'r>(&self, row: &'r Row, field: LogicalField) -> &'r CellValue {
        row.get(self.column(field).index)
    }

    /// `(field, header)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (LogicalField, &str)> {
        LogicalField::ALL
            .iter()
            .map(move |&f| (f, self.header(f)))
    }
}
