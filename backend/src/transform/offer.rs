//! Personal offer links.
//!
//! The amount and percent labels travel in the query string obfuscated with
//! a positional shift: character `i` becomes `code_point + key + i`, written
//! as at least four lowercase hex digits, fields joined by `-`. Anyone who
//! knows the key can reverse it; it only keeps the values from being read
//! off the link at a glance.

use crate::error::OfferError;

/// Shift used by the landing page.
pub const DEFAULT_KEY: u32 = 128;

/// Locale used when the row's locale is missing or unsupported.
pub const DEFAULT_LOCALE: &str = "ka";

/// Locales the landing page is published in.
pub const SUPPORTED_LOCALES: [&str; 4] = ["ka", "tr", "ru", "en"];

const OFFER_BASE_URL: &str = "https://www.ambassadoribet.com";

/// Obfuscate `text` for an offer query parameter.
///
/// Fields wider than four digits are written in full, never wrapped.
pub fn simple_encrypt(text: &str, key: u32) -> String {
    text.chars()
        .enumerate()
        .map(|(i, ch)| format!("{:04x}", u64::from(u32::from(ch)) + u64::from(key) + i as u64))
        .collect::<Vec<_>>()
        .join("-")
}

/// Reverse [`simple_encrypt`].
pub fn simple_decrypt(encoded: &str, key: u32) -> Result<String, OfferError> {
    if encoded.is_empty() {
        return Ok(String::new());
    }

    encoded
        .split('-')
        .enumerate()
        .map(|(index, segment)| {
            let value = u64::from_str_radix(segment, 16).map_err(|_| OfferError::InvalidHex {
                index,
                segment: segment.to_string(),
            })?;
            value
                .checked_sub(u64::from(key) + index as u64)
                .and_then(|cp| u32::try_from(cp).ok())
                .and_then(char::from_u32)
                .ok_or(OfferError::InvalidCodePoint { index })
        })
        .collect()
}

/// Lower-cased locale if supported, [`DEFAULT_LOCALE`] otherwise.
pub fn offer_locale(locale: &str) -> String {
    let loc = locale.to_lowercase();
    if SUPPORTED_LOCALES.contains(&loc.as_str()) {
        loc
    } else {
        DEFAULT_LOCALE.to_string()
    }
}

/// Personal offer URL for the given amount and percent labels.
///
/// ```ignore
/// let url = build_offer_url("EN", "50₾", "20%", 128);
/// assert!(url.starts_with("https://www.ambassadoribet.com/en/personal-offer?offam="));
/// ```
pub fn build_offer_url(locale: &str, amount: &str, percent: &str, key: u32) -> String {
    format!(
        "{}/{}/personal-offer?offam={}&offperc={}",
        OFFER_BASE_URL,
        offer_locale(locale),
        simple_encrypt(amount, key),
        simple_encrypt(percent, key),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_single_char() {
        // 'A' = 65, 65 + 128 + 0 = 193
        assert_eq!(simple_encrypt("A", 128), "00c1");
    }

    #[test]
    fn test_encrypt_is_positional() {
        // same character, shifted by its index
        assert_eq!(simple_encrypt("AA", 128), "00c1-00c2");
        assert_eq!(simple_encrypt("", 128), "");
    }

    #[test]
    fn test_encrypt_labels() {
        // '5'=0x35 '0'=0x30 '₾'=0x20be
        assert_eq!(simple_encrypt("50₾", 128), "00b5-00b1-2140");
        // '2'=0x32 '0'=0x30 '%'=0x25
        assert_eq!(simple_encrypt("20%", 128), "00b2-00b1-00a7");
    }

    #[test]
    fn test_encrypt_widens_past_four_digits() {
        let encoded = simple_encrypt("\u{FFFF}", 128);
        assert_eq!(encoded, "1007f");
    }

    #[test]
    fn test_decrypt_reverses_encrypt() {
        for text in ["50₾", "20%", "ქართული", ""] {
            let encoded = simple_encrypt(text, DEFAULT_KEY);
            assert_eq!(simple_decrypt(&encoded, DEFAULT_KEY).unwrap(), text);
        }
    }

    #[test]
    fn test_decrypt_rejects_garbage() {
        assert_eq!(
            simple_decrypt("00c1-zz", 128),
            Err(OfferError::InvalidHex { index: 1, segment: "zz".into() })
        );
        assert_eq!(
            simple_decrypt("0001", 128),
            Err(OfferError::InvalidCodePoint { index: 0 })
        );
    }

    #[test]
    fn test_unsupported_locale_falls_back() {
        let url = build_offer_url("xx", "50₾", "20%", 128);
        assert!(url.starts_with("https://www.ambassadoribet.com/ka/personal-offer?"));
    }

    #[test]
    fn test_locale_is_lowercased() {
        assert_eq!(offer_locale("RU"), "ru");
        assert_eq!(offer_locale(""), "ka");
    }

    #[test]
    fn test_build_offer_url_shape() {
        let url = build_offer_url("en", "50₾", "20%", 128);
        assert_eq!(
            url,
            "https://www.ambassadoribet.com/en/personal-offer?offam=00b5-00b1-2140&offperc=00b2-00b1-00a7"
        );
    }
}
