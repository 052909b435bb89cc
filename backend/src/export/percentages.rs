//! Percentage roster: user ids grouped by offered percentage.

use crate::export::workbook::Workbook;
use crate::models::{CellValue, Dataset, FieldMapping, LogicalField};
use crate::transform::grouper::{grouped_workbook, sanitize_sheet, GroupKey, SheetPolicy};
use crate::transform::normalize::{percent_label, percent_number};

/// Sheet for rows whose percentage cannot be read.
pub const UNKNOWN_PERCENT_SHEET: &str = "Unknown%";

/// One sheet per percentage, titled with its label (`20%`).
///
/// Rows are keyed by the unrounded value; keys that round to the same
/// label share that label's sheet. A missing user id still takes a row,
/// written as an empty cell.
pub fn export_percentages(dataset: &Dataset, mapping: &FieldMapping) -> Workbook {
    let mut workbook = grouped_workbook(
        &dataset.rows,
        &[(1, "userid")],
        SheetPolicy::MergeByTitle,
        |row| {
            percent_number(mapping.get(row, LogicalField::Percent))
                .map_or(GroupKey::Missing, GroupKey::Number)
        },
        |key| match key {
            GroupKey::Number(n) => {
                sanitize_sheet(Some(&percent_label(Some(*n))), UNKNOWN_PERCENT_SHEET)
            }
            _ => UNKNOWN_PERCENT_SHEET.to_string(),
        },
        |row| Some(vec![(1, roster_id(mapping.get(row, LogicalField::UserId)))]),
    );

    if workbook.sheets().is_empty() {
        workbook
            .add_sheet(UNKNOWN_PERCENT_SHEET)
            .set(1, 1, CellValue::text("userid"));
    }

    workbook
}

/// `"<id>,"`, or an empty text cell when the id is missing.
fn roster_id(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::Empty => CellValue::Text(String::new()),
        other => CellValue::Text(format!("{},", other)),
    }
}
