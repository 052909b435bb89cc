//! In-memory workbooks produced by the exporters.
//!
//! Cells are addressed 1-based (`row`, `col`) the way they appear in a
//! spreadsheet; conversion to the writer's 0-based grid happens only in
//! [`Workbook::to_xlsx_bytes`].

use rust_xlsxwriter::Workbook as XlsxWorkbook;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ExportResult;
use crate::models::CellValue;

/// Longest sheet name a spreadsheet accepts.
pub const MAX_SHEET_NAME_CHARS: usize = 31;

/// One named grid of cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<(u32, u16), CellValue>,
}

impl Sheet {
    fn new(name: String) -> Self {
        Self {
            name,
            cells: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a value at a 1-based address, replacing what was there.
    pub fn set(&mut self, row: u32, col: u16, value: CellValue) {
        debug_assert!(row >= 1 && col >= 1, "cell addresses are 1-based");
        self.cells.insert((row, col), value);
    }

    pub fn get(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    /// Highest row holding any cell, 0 for an empty sheet.
    pub fn max_row(&self) -> u32 {
        // keys sort by row first
        self.cells.last_key_value().map_or(0, |((r, _), _)| *r)
    }

    /// Write `cells` on the row after the last used one.
    pub fn append_row(&mut self, cells: Vec<(u16, CellValue)>) {
        let row = self.max_row() + 1;
        for (col, value) in cells {
            self.set(row, col, value);
        }
    }

    /// Values of one column from `from_row` down to [`Sheet::max_row`].
    pub fn column(&self, col: u16, from_row: u32) -> Vec<CellValue> {
        (from_row..=self.max_row())
            .map(|r| self.get(r, col).cloned().unwrap_or_default())
            .collect()
    }

    pub fn cells(&self) -> impl Iterator<Item = ((u32, u16), &CellValue)> {
        self.cells.iter().map(|(k, v)| (*k, v))
    }
}

/// An ordered collection of uniquely named sheets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new sheet.
    ///
    /// The title is first made acceptable to spreadsheet writers, then
    /// unique ignoring case: a clashing title gets a numeric suffix (`en`,
    /// `en1`, `en2`, ...). The stored name is exactly the serialized one.
    pub fn add_sheet(&mut self, title: &str) -> &mut Sheet {
        let name = self.unique_name(&writer_safe_name(title));
        self.sheets.push(Sheet::new(name));
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }

    /// The sheet titled exactly `title`, created if absent.
    pub fn sheet_or_insert(&mut self, title: &str) -> &mut Sheet {
        let safe = writer_safe_name(title);
        match self.sheets.iter().position(|s| s.name == safe) {
            Some(i) => &mut self.sheets[i],
            None => self.add_sheet(title),
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Rows below the header row, summed over all sheets.
    pub fn body_rows(&self) -> u32 {
        self.sheets.iter().map(|s| s.max_row().saturating_sub(1)).sum()
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    fn is_taken(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.sheets.iter().any(|s| s.name.to_lowercase() == lower)
    }

    fn unique_name(&self, title: &str) -> String {
        if !self.is_taken(title) {
            return title.to_string();
        }
        let mut n: u32 = 1;
        loop {
            let suffix = n.to_string();
            let keep = MAX_SHEET_NAME_CHARS.saturating_sub(suffix.len());
            let candidate: String = title.chars().take(keep).chain(suffix.chars()).collect();
            if !self.is_taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Serialize to XLSX bytes.
    pub fn to_xlsx_bytes(&self) -> ExportResult<Vec<u8>> {
        let mut workbook = self.to_xlsx()?;
        Ok(workbook.save_to_buffer()?)
    }

    /// Serialize and write to `path`.
    pub fn save(&self, path: &Path) -> ExportResult<()> {
        let bytes = self.to_xlsx_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn to_xlsx(&self) -> ExportResult<XlsxWorkbook> {
        let mut workbook = XlsxWorkbook::new();

        if self.sheets.is_empty() {
            workbook.add_worksheet().set_name("Sheet1")?;
            return Ok(workbook);
        }

        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;

            for ((row, col), value) in sheet.cells() {
                let (r, c) = (row - 1, col - 1);
                match value {
                    CellValue::Empty => {}
                    CellValue::Text(s) => {
                        worksheet.write_string(r, c, s)?;
                    }
                    CellValue::Number(n) => {
                        worksheet.write_number(r, c, *n)?;
                    }
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(r, c, *b)?;
                    }
                }
            }
        }

        Ok(workbook)
    }
}

/// Adjust names that spreadsheet applications refuse even though they pass
/// sheet-title sanitization: surrounding apostrophes and `History`.
fn writer_safe_name(name: &str) -> String {
    let trimmed = name.trim_matches('\'');
    if trimmed.is_empty() {
        "Sheet".to_string()
    } else if trimmed.eq_ignore_ascii_case("history") {
        format!("{}-", trimmed)
    } else {
        trimmed.to_string()
    }
}
