//! Canonical labels for free-text percentage and currency cells.
//!
//! Every function here is total: text that cannot be read degrades to "no
//! value" (an empty label) rather than an error, so one bad cell never stops
//! a batch.
//!
//! | raw            | percent label | lari label |
//! |----------------|---------------|------------|
//! | `"20"`         | `20%`         | `20₾`      |
//! | `"20%"`        | `20%`         | `20₾`      |
//! | `"0.2"`        | `20%`         | `0₾`       |
//! | `"50 GEL"`     | (empty)       | `50₾`      |
//! | `"50₾"`        | (empty)       | `50₾`      |

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::CellValue;

/// Georgian lari sign appended to amount labels.
pub const LARI: char = '₾';

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Numeric percentage behind a raw cell.
///
/// A trailing `%` is ignored and values in `[0, 1]` are read as fractions
/// (`0.2` is 20). The result is not rounded: it is the grouping key, so
/// `20` and `20.0` are equal while `20.4` and `20.6` stay apart.
pub fn percent_number(raw: &CellValue) -> Option<f64> {
    let num = match raw {
        CellValue::Empty | CellValue::Bool(_) => return None,
        CellValue::Number(n) => *n,
        CellValue::Text(s) => {
            let mut s = s.trim();
            if let Some(stripped) = s.strip_suffix('%') {
                s = stripped.trim();
            }
            s.parse::<f64>().ok()?
        }
    };

    if !num.is_finite() {
        return None;
    }
    if (0.0..=1.0).contains(&num) {
        Some(num * 100.0)
    } else {
        Some(num)
    }
}

/// `"<n>%"` with `n` rounded half-to-even, `""` for no value.
pub fn percent_label(num: Option<f64>) -> String {
    match num {
        Some(n) => format!("{}%", n.round_ties_even() as i64),
        None => String::new(),
    }
}

/// Display label for a percentage cell.
///
/// Unreadable text is kept only when it already looks like a label
/// (ends in `%`, at least two characters).
pub fn normalize_percent(raw: &CellValue) -> String {
    match percent_number(raw) {
        Some(n) => percent_label(Some(n)),
        None => {
            let text = raw.text_or_blank();
            let s = text.trim();
            if s.ends_with('%') && s.chars().count() >= 2 {
                s.to_string()
            } else {
                String::new()
            }
        }
    }
}

/// Display label for an amount cell, in lari.
///
/// Text already ending in `₾` passes through; otherwise the first run of
/// digits anywhere in the text is used, so decimals are truncated
/// (`"50.75"` is `50₾`).
pub fn normalize_amount_to_lari(raw: &CellValue) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let text = raw.text_or_blank();
    let s = text.trim();
    if s.ends_with(LARI) && s.chars().count() >= 2 {
        return s.to_string();
    }
    match DIGITS.find(s) {
        Some(m) => format!("{}{}", m.as_str(), LARI),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> CellValue {
        CellValue::text(s)
    }

    #[test]
    fn test_percent_number_forms() {
        assert_eq!(percent_number(&t("0.2")), Some(20.0));
        assert_eq!(percent_number(&t("20%")), Some(20.0));
        assert_eq!(percent_number(&t(" 20 % ")), Some(20.0));
        assert_eq!(percent_number(&t("20")), Some(20.0));
        assert_eq!(percent_number(&CellValue::Number(0.35)), Some(35.0));
        assert_eq!(percent_number(&CellValue::Number(15.0)), Some(15.0));
    }

    #[test]
    fn test_percent_number_no_value() {
        assert_eq!(percent_number(&t("abc")), None);
        assert_eq!(percent_number(&t("%")), None);
        assert_eq!(percent_number(&CellValue::Empty), None);
        assert_eq!(percent_number(&t("nan")), None);
        assert_eq!(percent_number(&t("inf%")), None);
    }

    #[test]
    fn test_unit_interval_is_inclusive() {
        assert_eq!(percent_number(&t("1")), Some(100.0));
        assert_eq!(percent_number(&t("0")), Some(0.0));
        assert_eq!(percent_number(&t("1.5")), Some(1.5));
    }

    #[test]
    fn test_percent_label_rounds_half_to_even() {
        assert_eq!(percent_label(Some(20.4)), "20%");
        assert_eq!(percent_label(Some(20.6)), "21%");
        assert_eq!(percent_label(Some(20.5)), "20%");
        assert_eq!(percent_label(Some(21.5)), "22%");
        assert_eq!(percent_label(None), "");
    }

    #[test]
    fn test_normalize_percent() {
        assert_eq!(normalize_percent(&t("0.5")), "50%");
        assert_eq!(normalize_percent(&t("20%")), "20%");
        assert_eq!(normalize_percent(&t("abc")), "");
        // unreadable but already label-shaped text survives
        assert_eq!(normalize_percent(&t(" ten% ")), "ten%");
        assert_eq!(normalize_percent(&t("%")), "");
        assert_eq!(normalize_percent(&CellValue::Empty), "");
    }

    #[test]
    fn test_normalize_amount_to_lari() {
        assert_eq!(normalize_amount_to_lari(&t("50 GEL")), "50₾");
        assert_eq!(normalize_amount_to_lari(&t("50₾")), "50₾");
        assert_eq!(normalize_amount_to_lari(&t(" 75 ₾ ")), "75 ₾");
        assert_eq!(normalize_amount_to_lari(&t("100GEL")), "100₾");
        assert_eq!(normalize_amount_to_lari(&t("GEL 20.75")), "20₾");
        assert_eq!(normalize_amount_to_lari(&t("₾")), "");
        assert_eq!(normalize_amount_to_lari(&t("none")), "");
        assert_eq!(normalize_amount_to_lari(&CellValue::Number(150.0)), "150₾");
        assert_eq!(normalize_amount_to_lari(&CellValue::Empty), "");
    }

    #[test]
    fn test_normalization_is_pure() {
        let inputs = ["20", "0.2", "x", "33.3%", "100 GEL"];
        for raw in inputs {
            let cell = t(raw);
            assert_eq!(normalize_percent(&cell), normalize_percent(&cell));
            assert_eq!(normalize_amount_to_lari(&cell), normalize_amount_to_lari(&cell));
        }
    }
}
