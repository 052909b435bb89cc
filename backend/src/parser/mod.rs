//! Input table reader with format, encoding and delimiter auto-detection.
//!
//! Spreadsheets (`.xlsx`, `.xls`, `.ods`, ...) are read from their first
//! worksheet; anything else is treated as delimited text. The first row is
//! the header row in both cases.

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, ExcelDateTime, Reader, Sheets};
use serde::Serialize;
use std::collections::HashSet;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use crate::error::{DatasetError, DatasetResult};
use crate::models::{CellValue, Dataset, Row};

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];
const TEXT_EXTENSIONS: [&str; 3] = ["csv", "tsv", "txt"];

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

/// How the input was read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SourceFormat {
    Delimited { encoding: String, delimiter: char },
    Workbook { sheet: String },
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub dataset: Dataset,
    pub format: SourceFormat,
}

// =============================================================================
// Entry points
// =============================================================================

/// Read a table from disk, choosing the reader by extension.
pub fn parse_file<P: AsRef<Path>>(path: P) -> DatasetResult<ParseResult> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
        let sheets = open_workbook_auto(path)?;
        return parse_sheets(sheets);
    }
    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        let bytes = std::fs::read(path)?;
        return parse_text_auto(&bytes);
    }
    if ext.is_empty() {
        let bytes = std::fs::read(path)?;
        return parse_bytes(&bytes);
    }
    Err(DatasetError::UnsupportedFormat(ext))
}

/// Read a table from uploaded bytes, sniffing spreadsheet containers.
pub fn parse_bytes(bytes: &[u8]) -> DatasetResult<ParseResult> {
    if bytes.is_empty() {
        return Err(DatasetError::EmptyFile);
    }
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        let sheets = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        return parse_sheets(sheets);
    }
    parse_text_auto(bytes)
}

// =============================================================================
// Spreadsheets
// =============================================================================

fn parse_sheets<RS: Read + Seek>(mut sheets: Sheets<RS>) -> DatasetResult<ParseResult> {
    let sheet = sheets
        .sheet_names()
        .first()
        .cloned()
        .ok_or(DatasetError::NoHeaders)?;
    let range = sheets.worksheet_range(&sheet)?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or(DatasetError::NoHeaders)?;
    let headers = normalize_headers(
        header_row
            .iter()
            .map(|c| cell_value(c).to_string())
            .collect(),
    );

    let records = rows
        .map(|r| Row::new(r.iter().map(cell_value).collect()))
        .filter(|r| !is_blank_row(r))
        .collect();

    Ok(ParseResult {
        dataset: Dataset::new(headers, records),
        format: SourceFormat::Workbook { sheet },
    })
}

/// Map a spreadsheet cell onto the raw cell model.
pub fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::text(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::text(excel_datetime_text(dt)),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s.as_str()),
    }
}

/// Dates as `YYYY-MM-DD HH:MM:SS`, durations as `HH:MM:SS`; the serial
/// number only when neither conversion applies.
fn excel_datetime_text(dt: &ExcelDateTime) -> String {
    if dt.is_duration() {
        if let Some(d) = dt.as_duration() {
            let secs = d.num_seconds();
            return format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60);
        }
    } else if let Some(naive) = dt.as_datetime() {
        return naive.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    dt.to_string()
}

// =============================================================================
// Delimited text
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "windows-1251" | "cp1251" => "windows-1251".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match String::from_utf8(bytes.to_vec()) {
            Ok(s) => s,
            Err(_) => String::from_utf8_lossy(bytes).into_owned(),
        },
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        "windows-1251" | "cp1251" => encoding_rs::WINDOWS_1251.decode(bytes).0.into_owned(),
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(enc) => enc.decode(bytes).0.into_owned(),
            // Fallback: try UTF-8 with lossy conversion
            None => String::from_utf8_lossy(bytes).into_owned(),
        },
    };

    decoded.trim_start_matches('\u{feff}').to_string()
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse delimited bytes with auto-detection of encoding and delimiter.
pub fn parse_text_auto(bytes: &[u8]) -> DatasetResult<ParseResult> {
    if bytes.is_empty() {
        return Err(DatasetError::EmptyFile);
    }
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let dataset = parse_delimited(&content, delimiter)?;

    Ok(ParseResult {
        dataset,
        format: SourceFormat::Delimited { encoding, delimiter },
    })
}

/// Parse delimited text with an explicit single-byte delimiter.
///
/// # Example
/// ```ignore
/// let ds = parse_delimited("userid;nickname\n7;nino", ';')?;
/// assert_eq!(ds.headers, vec!["userid", "nickname"]);
/// ```
pub fn parse_delimited(content: &str, delimiter: char) -> DatasetResult<Dataset> {
    if content.trim().is_empty() {
        return Err(DatasetError::EmptyFile);
    }
    let delimiter = u8::try_from(delimiter).map_err(|_| DatasetError::Parse {
        line: 1,
        message: format!("delimiter '{}' is not a single byte", delimiter),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let header_record = records
        .next()
        .ok_or(DatasetError::NoHeaders)?
        .map_err(csv_error)?;
    let headers = normalize_headers(header_record.iter().map(|h| h.trim().to_string()).collect());

    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(csv_error)?;
        let row = Row::new(record.iter().map(CellValue::text).collect());
        if !is_blank_row(&row) {
            rows.push(row);
        }
    }

    Ok(Dataset::new(headers, rows))
}

fn csv_error(e: csv::Error) -> DatasetError {
    DatasetError::Parse {
        line: e.position().map_or(0, |p| p.line()),
        message: e.to_string(),
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Make headers unique: blanks become `Unnamed: <i>`, repeats get `.1`, `.2`...
pub fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut headers = Vec::with_capacity(raw.len());

    for (i, header) in raw.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            header
        };
        let mut name = base.clone();
        let mut n = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, n);
            n += 1;
        }
        seen.insert(name.clone());
        headers.push(name);
    }

    headers
}

fn is_blank_row(row: &Row) -> bool {
    row.cells().iter().all(|c| match c {
        CellValue::Empty => true,
        CellValue::Text(s) => s.trim().is_empty(),
        _ => false,
    })
}
