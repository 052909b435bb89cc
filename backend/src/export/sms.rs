//! SMS sheet: one sheet per locale, each row carrying a personal offer link.

use crate::export::workbook::Workbook;
use crate::models::{CellValue, Dataset, FieldMapping, LogicalField};
use crate::transform::grouper::{grouped_workbook, sanitize_sheet, GroupKey, SheetPolicy};
use crate::transform::normalize::{normalize_amount_to_lari, normalize_percent, LARI};
use crate::transform::offer::{build_offer_url, DEFAULT_LOCALE};

/// Sheet title for rows without a locale.
pub const UNKNOWN_LOCALE_SHEET: &str = "unknown";

pub const LINK_COL: u16 = 1;
pub const NICKNAME_COL: u16 = 2;
pub const PHONE_COL: u16 = 3;
pub const REQUESTED_DEP_COL: u16 = 8;
pub const COIN_REWARD_COL: u16 = 9;

const HEADER: [(u16, &str); 5] = [
    (LINK_COL, "Link"),
    (NICKNAME_COL, "nickname"),
    (PHONE_COL, "phone"),
    (REQUESTED_DEP_COL, "Requested_dep"),
    (COIN_REWARD_COL, "Coin_Reward_Value"),
];

/// Offer link for one row, `None` unless both the amount and the percent
/// normalize to complete labels.
pub fn offer_link(locale: &CellValue, amount: &CellValue, percent: &CellValue, key: u32) -> Option<String> {
    let amount = normalize_amount_to_lari(amount);
    let percent = normalize_percent(percent);

    let amount_ok = amount.chars().count() >= 2 && amount.ends_with(LARI);
    let percent_ok = percent.chars().count() >= 2 && percent.ends_with('%');
    if !(amount_ok && percent_ok) {
        return None;
    }

    let locale = locale
        .as_text()
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
    Some(build_offer_url(&locale, &amount, &percent, key))
}

/// One sheet per distinct raw locale value.
///
/// Only the link is derived; nickname (trimmed), phone, requested deposit
/// and coin reward are copied through unchanged.
pub fn export_sms(dataset: &Dataset, mapping: &FieldMapping, key: u32) -> Workbook {
    grouped_workbook(
        &dataset.rows,
        &HEADER,
        SheetPolicy::Distinct,
        |row| GroupKey::from_cell(mapping.get(row, LogicalField::Locale)),
        |group| sanitize_sheet(group.title_text().as_deref(), UNKNOWN_LOCALE_SHEET),
        |row| {
            let requested = mapping.get(row, LogicalField::RequestedDeposit);
            let link = offer_link(
                mapping.get(row, LogicalField::Locale),
                requested,
                mapping.get(row, LogicalField::Percent),
                key,
            )
            .unwrap_or_default();
            let nickname = mapping.get(row, LogicalField::Nickname).text_or_blank();

            Some(vec![
                (LINK_COL, CellValue::Text(link)),
                (NICKNAME_COL, CellValue::Text(nickname.trim().to_string())),
                (PHONE_COL, mapping.get(row, LogicalField::Phone).clone()),
                (REQUESTED_DEP_COL, requested.clone()),
                (COIN_REWARD_COL, mapping.get(row, LogicalField::CoinReward).clone()),
            ])
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Row;
    use crate::transform::offer::{simple_decrypt, DEFAULT_KEY};
    use crate::transform::resolver::resolve_fields;

    const HEADERS: [&str; 7] = [
        "userid", "nickname", "phone", "percentages", "localecode", "requested_dep", "coin_reward_value",
    ];

    fn sms_row(locale: CellValue, dep: &str, pct: &str) -> Row {
        Row::new(vec![
            CellValue::text("1"),
            CellValue::text(" nino "),
            CellValue::Number(599_123_456.0),
            CellValue::text(pct),
            locale,
            CellValue::text(dep),
            CellValue::Number(25.0),
        ])
    }

    fn export(rows: Vec<Row>) -> Workbook {
        let headers: Vec<String> = HEADERS.iter().map(|s| s.to_string()).collect();
        let mapping = resolve_fields(&headers).unwrap();
        export_sms(&Dataset::new(headers, rows), &mapping, DEFAULT_KEY)
    }

    #[test]
    fn test_header_layout() {
        let wb = export(vec![sms_row(CellValue::text("ka"), "50", "20")]);
        let sheet = wb.sheet("ka").unwrap();
        assert_eq!(sheet.get(1, 1), Some(&CellValue::text("Link")));
        assert_eq!(sheet.get(1, 2), Some(&CellValue::text("nickname")));
        assert_eq!(sheet.get(1, 3), Some(&CellValue::text("phone")));
        for col in 4..=7 {
            assert_eq!(sheet.get(1, col), None);
        }
        assert_eq!(sheet.get(1, 8), Some(&CellValue::text("Requested_dep")));
        assert_eq!(sheet.get(1, 9), Some(&CellValue::text("Coin_Reward_Value")));
    }

    #[test]
    fn test_row_values_copied_raw() {
        let wb = export(vec![sms_row(CellValue::text("tr"), "50 GEL", "0.2")]);
        let sheet = wb.sheet("tr").unwrap();
        assert_eq!(sheet.get(2, 2), Some(&CellValue::text("nino")));
        assert_eq!(sheet.get(2, 3), Some(&CellValue::Number(599_123_456.0)));
        assert_eq!(sheet.get(2, 8), Some(&CellValue::text("50 GEL")));
        assert_eq!(sheet.get(2, 9), Some(&CellValue::Number(25.0)));

        let link = sheet.get(2, 1).unwrap().to_string();
        assert!(link.starts_with("https://www.ambassadoribet.com/tr/personal-offer?offam="));
    }

    #[test]
    fn test_link_blank_without_amount_or_percent() {
        let wb = export(vec![
            sms_row(CellValue::text("en"), "none", "20%"),
            sms_row(CellValue::text("en"), "50", "n/a"),
        ]);
        let sheet = wb.sheet("en").unwrap();
        assert_eq!(sheet.get(2, 1), Some(&CellValue::Text(String::new())));
        assert_eq!(sheet.get(3, 1), Some(&CellValue::Text(String::new())));
    }

    #[test]
    fn test_grouped_by_raw_locale() {
        let wb = export(vec![
            sms_row(CellValue::text("en"), "50", "20"),
            sms_row(CellValue::text("EN"), "50", "20"),
            sms_row(CellValue::Empty, "50", "20"),
            sms_row(CellValue::text("xx"), "50", "20"),
        ]);
        assert_eq!(wb.sheet_names(), vec!["EN", "en1", "xx", "unknown"]);

        // missing and unsupported locales both link to the default locale
        let unknown_link = wb.sheet("unknown").unwrap().get(2, 1).unwrap().to_string();
        assert!(unknown_link.contains("/ka/personal-offer"));
        let xx_link = wb.sheet("xx").unwrap().get(2, 1).unwrap().to_string();
        assert!(xx_link.contains("/ka/personal-offer"));
        let upper_link = wb.sheet("EN").unwrap().get(2, 1).unwrap().to_string();
        assert!(upper_link.contains("/en/personal-offer"));
    }

    #[test]
    fn test_link_parameters_decode_to_labels() {
        let link = offer_link(
            &CellValue::text(" en "),
            &CellValue::text("100GEL"),
            &CellValue::text("0.5"),
            DEFAULT_KEY,
        )
        .unwrap();
        let query = link.split_once('?').unwrap().1;
        let (offam, offperc) = query.split_once('&').unwrap();
        let offam = offam.strip_prefix("offam=").unwrap();
        let offperc = offperc.strip_prefix("offperc=").unwrap();
        assert_eq!(simple_decrypt(offam, DEFAULT_KEY).unwrap(), "100₾");
        assert_eq!(simple_decrypt(offperc, DEFAULT_KEY).unwrap(), "50%");
    }

    #[test]
    fn test_quoted_locale_next_to_plain_one_still_serializes() {
        let wb = export(vec![
            sms_row(CellValue::text("'ka'"), "50", "20"),
            sms_row(CellValue::text("ka"), "60", "20"),
        ]);
        assert_eq!(wb.sheet_names(), vec!["ka", "ka1"]);
        assert!(wb.to_xlsx_bytes().is_ok());
    }
}
