//! Group rows by a key and lay each group out on its own sheet.
//!
//! The three exporters differ only in how they key a row, title a sheet and
//! turn a row into cells, so they all go through [`grouped_workbook`].
//!
//! ```text
//! rows                          workbook
//! ┌──────────────────────┐      ┌──────────────┐
//! │ uid 1, locale en     │      │ sheet "en"   │ uid 1, uid 3
//! │ uid 2, locale ka     │  →   ├──────────────┤
//! │ uid 3, locale en     │      │ sheet "ka"   │ uid 2
//! └──────────────────────┘      └──────────────┘
//! ```
//!
//! Groups come out in key order: numbers ascending, then text, then the
//! missing-value group last.

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::export::workbook::{Workbook, MAX_SHEET_NAME_CHARS};
use crate::models::{format_number, CellValue, Row};

static SHEET_FORBIDDEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[:\\/?*\[\]]").unwrap());

/// Sheet title for a group value.
///
/// Missing or blank names use `fallback`; `: \ / ? * [ ]` become `-`; the
/// result is cut to 31 characters.
pub fn sanitize_sheet(name: Option<&str>, fallback: &str) -> String {
    let source = match name {
        Some(n) if !n.trim().is_empty() => n,
        _ => fallback,
    };
    let cleaned: String = SHEET_FORBIDDEN
        .replace_all(source, "-")
        .chars()
        .take(MAX_SHEET_NAME_CHARS)
        .collect();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

// =============================================================================
// Group keys
// =============================================================================

/// Orderable grouping key built from a raw cell.
#[derive(Debug, Clone)]
pub enum GroupKey {
    Number(f64),
    Text(String),
    Missing,
}

impl GroupKey {
    pub fn from_cell(cell: &CellValue) -> Self {
        match cell {
            CellValue::Empty => GroupKey::Missing,
            CellValue::Number(n) => GroupKey::Number(*n),
            other => GroupKey::Text(other.to_string()),
        }
    }

    /// Text used to title the group's sheet; `None` for the missing group.
    pub fn title_text(&self) -> Option<String> {
        match self {
            GroupKey::Number(n) => Some(format_number(*n)),
            GroupKey::Text(s) => Some(s.clone()),
            GroupKey::Missing => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            GroupKey::Number(_) => 0,
            GroupKey::Text(_) => 1,
            GroupKey::Missing => 2,
        }
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (GroupKey::Number(a), GroupKey::Number(b)) => a.total_cmp(b),
            (GroupKey::Text(a), GroupKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

// =============================================================================
// Grouping
// =============================================================================

/// How groups whose titles coincide are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetPolicy {
    /// Every group gets its own sheet, clashing titles are suffixed.
    Distinct,
    /// Groups with the same title share one sheet, in key order.
    MergeByTitle,
}

/// Rows bucketed by `key`, buckets in key order, rows in input order.
pub fn group_rows<'r, K, F>(rows: &'r [Row], key: F) -> Vec<(K, Vec<&'r Row>)>
where
    K: Ord,
    F: Fn(&Row) -> K,
{
    let mut groups: BTreeMap<K, Vec<&'r Row>> = BTreeMap::new();
    for row in rows {
        groups.entry(key(row)).or_default().push(row);
    }
    groups.into_iter().collect()
}

/// Build a workbook with one sheet per group.
///
/// `header` is written on row 1 of every new sheet. `row_cells` returns the
/// `(column, value)` pairs for a row, or `None` to leave the row out.
pub fn grouped_workbook<K, FK, FT, FR>(
    rows: &[Row],
    header: &[(u16, &str)],
    policy: SheetPolicy,
    key: FK,
    title: FT,
    row_cells: FR,
) -> Workbook
where
    K: Ord,
    FK: Fn(&Row) -> K,
    FT: Fn(&K) -> String,
    FR: Fn(&Row) -> Option<Vec<(u16, CellValue)>>,
{
    let mut workbook = Workbook::new();

    for (group_key, members) in group_rows(rows, key) {
        let sheet_title = title(&group_key);
        let sheet = match policy {
            SheetPolicy::Distinct => workbook.add_sheet(&sheet_title),
            SheetPolicy::MergeByTitle => workbook.sheet_or_insert(&sheet_title),
        };
        if sheet.max_row() == 0 {
            for (col, text) in header {
                sheet.set(1, *col, CellValue::text(*text));
            }
        }
        for row in members {
            if let Some(cells) = row_cells(row) {
                sheet.append_row(cells);
            }
        }
    }

    workbook
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Row {
        Row::new(values.iter().map(|v| CellValue::text(*v)).collect())
    }

    #[test]
    fn test_sanitize_replaces_forbidden_chars() {
        assert_eq!(sanitize_sheet(Some("a:b\\c/d?e*f[g]h"), "sheet"), "a-b-c-d-e-f-g-h");
    }

    #[test]
    fn test_sanitize_truncates_to_31_chars() {
        let long = "ა".repeat(40);
        let name = sanitize_sheet(Some(&long), "sheet");
        assert_eq!(name.chars().count(), 31);
    }

    #[test]
    fn test_sanitize_falls_back_on_blank() {
        assert_eq!(sanitize_sheet(None, "unknown"), "unknown");
        assert_eq!(sanitize_sheet(Some("   "), "Unknown"), "Unknown");
        assert_eq!(sanitize_sheet(Some(""), "sheet"), "sheet");
    }

    #[test]
    fn test_group_key_order() {
        let mut keys = vec![
            GroupKey::Missing,
            GroupKey::Text("b".into()),
            GroupKey::Number(50.0),
            GroupKey::Text("a".into()),
            GroupKey::Number(5.0),
        ];
        keys.sort();
        let titles: Vec<Option<String>> = keys.iter().map(GroupKey::title_text).collect();
        assert_eq!(
            titles,
            vec![
                Some("5".into()),
                Some("50".into()),
                Some("a".into()),
                Some("b".into()),
                None
            ]
        );
    }

    #[test]
    fn test_group_rows_keeps_input_order_within_group() {
        let rows = vec![row(&["1", "en"]), row(&["2", "ka"]), row(&["3", "en"])];
        let groups = group_rows(&rows, |r| GroupKey::from_cell(r.get(1)));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, GroupKey::Text("en".into()));
        let ids: Vec<String> = groups[0].1.iter().map(|r| r.get(0).to_string()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_grouped_workbook_writes_header_and_skips_rows() {
        let rows = vec![row(&["1", "en"]), row(&["", "en"]), row(&["3", "ka"])];
        let wb = grouped_workbook(
            &rows,
            &[(1, "userid")],
            SheetPolicy::Distinct,
            |r| GroupKey::from_cell(r.get(1)),
            |k| sanitize_sheet(k.title_text().as_deref(), "unknown"),
            |r| {
                let uid = r.get(0).to_string();
                if uid.is_empty() {
                    None
                } else {
                    Some(vec![(1, CellValue::text(uid))])
                }
            },
        );
        assert_eq!(wb.sheet_names(), vec!["en", "ka"]);
        let en = wb.sheet("en").unwrap();
        assert_eq!(en.get(1, 1), Some(&CellValue::text("userid")));
        assert_eq!(en.max_row(), 2);
    }

    #[test]
    fn test_merge_policy_shares_sheet() {
        let rows = vec![row(&["a"]), row(&["b"])];
        let wb = grouped_workbook(
            &rows,
            &[(1, "h")],
            SheetPolicy::MergeByTitle,
            |r| GroupKey::from_cell(r.get(0)),
            |_| "same".to_string(),
            |r| Some(vec![(1, r.get(0).clone())]),
        );
        assert_eq!(wb.sheet_names(), vec!["same"]);
        assert_eq!(wb.sheets()[0].column(1, 1).len(), 3);
    }
}
