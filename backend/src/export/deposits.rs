//! Deposit roster: user ids grouped by the requested deposit as entered.

use crate::export::workbook::Workbook;
use crate::models::{CellValue, Dataset, FieldMapping, LogicalField};
use crate::transform::grouper::{grouped_workbook, sanitize_sheet, GroupKey, SheetPolicy};

/// Sheet title for rows without a requested deposit.
pub const UNKNOWN_DEPOSIT_SHEET: &str = "Unknown";

/// One sheet per distinct raw requested-deposit value.
///
/// Rows whose user id is blank once trimmed are left out entirely.
pub fn export_deposits(dataset: &Dataset, mapping: &FieldMapping) -> Workbook {
    grouped_workbook(
        &dataset.rows,
        &[(1, "userid"), (2, "Requested_dep")],
        SheetPolicy::Distinct,
        |row| GroupKey::from_cell(mapping.get(row, LogicalField::RequestedDeposit)),
        |key| sanitize_sheet(key.title_text().as_deref(), UNKNOWN_DEPOSIT_SHEET),
        |row| {
            let uid = mapping.get(row, LogicalField::UserId).text_or_blank();
            let uid = uid.trim();
            if uid.is_empty() {
                return None;
            }
            Some(vec![
                (1, CellValue::Text(format!("{},", uid))),
                (2, mapping.get(row, LogicalField::RequestedDeposit).clone()),
            ])
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Row;
    use crate::transform::resolver::resolve_fields;

    fn dataset(rows: Vec<(CellValue, CellValue)>) -> (Dataset, FieldMapping) {
        let headers: Vec<String> = [
            "UserID", "Nickname", "Phone", "Percentages", "LocaleCode", "Requested_Dep", "Coin_Reward_Value",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let rows = rows
            .into_iter()
            .map(|(uid, dep)| {
                Row::new(vec![
                    uid,
                    CellValue::Empty,
                    CellValue::Empty,
                    CellValue::Empty,
                    CellValue::Empty,
                    dep,
                ])
            })
            .collect();
        let mapping = resolve_fields(&headers).unwrap();
        (Dataset::new(headers, rows), mapping)
    }

    #[test]
    fn test_blank_user_id_rows_are_omitted() {
        let (ds, mapping) = dataset(vec![
            (CellValue::text("11"), CellValue::text("100")),
            (CellValue::text("   "), CellValue::text("100")),
            (CellValue::Empty, CellValue::text("100")),
            (CellValue::text(" 12 "), CellValue::text("100")),
        ]);
        let wb = export_deposits(&ds, &mapping);
        let sheet = wb.sheet("100").unwrap();
        assert_eq!(sheet.max_row(), 3);
        assert_eq!(sheet.get(2, 1), Some(&CellValue::text("11,")));
        assert_eq!(sheet.get(3, 1), Some(&CellValue::text("12,")));
        assert_eq!(sheet.get(3, 2), Some(&CellValue::text("100")));
    }

    #[test]
    fn test_groups_by_raw_value() {
        let (ds, mapping) = dataset(vec![
            (CellValue::text("1"), CellValue::text("100 GEL")),
            (CellValue::text("2"), CellValue::Number(100.0)),
            (CellValue::text("3"), CellValue::Empty),
            (CellValue::text("4"), CellValue::text("50/100")),
        ]);
        let wb = export_deposits(&ds, &mapping);
        // numbers first, then text, missing last; "/" sanitized
        assert_eq!(wb.sheet_names(), vec!["100", "100 GEL", "50-100", "Unknown"]);
        let number_sheet = wb.sheet("100").unwrap();
        assert_eq!(number_sheet.get(1, 2), Some(&CellValue::text("Requested_dep")));
        assert_eq!(number_sheet.get(2, 2), Some(&CellValue::Number(100.0)));
    }

    #[test]
    fn test_group_with_only_blank_ids_keeps_header_sheet() {
        let (ds, mapping) = dataset(vec![(CellValue::Empty, CellValue::text("75"))]);
        let wb = export_deposits(&ds, &mapping);
        assert_eq!(wb.sheet_names(), vec!["75"]);
        assert_eq!(wb.body_rows(), 0);
    }
}
