//! Field-level normalization shared by the entity cleaners

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Accepted date layouts, tried in order. First successful parse wins.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m-%d-%Y", "%m/%d/%Y"];

/// Country prefix for 10-digit local phone numbers
pub const LOCAL_PHONE_PREFIX: &str = "+91-";

/// Decimal places kept for prices (DECIMAL(10,2))
pub const MONEY_SCALE: u32 = 2;

/// Parse a date in any of [`DATE_FORMATS`]; `None` if none match.
///
/// Years must have four digits. chrono's `%Y` also takes shorter years, so
/// `15/01/24` would otherwise come back as year 24.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .find(|date| (1000..=9999).contains(&date.year()))
}

/// Normalize a phone number.
///
/// Non-digits are stripped except a leading `+`. A bare 10-digit number gets
/// the local country prefix; anything else keeps its cleaned digits. `None`
/// when no digits remain.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let international = raw.starts_with('+');
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return None;
    }

    if international {
        Some(format!("+{}", digits))
    } else if digits.len() == 10 {
        Some(format!("{}{}", LOCAL_PHONE_PREFIX, digits))
    } else {
        Some(digits)
    }
}

/// Parse a money amount, tolerating currency symbols and thousands separators
pub fn parse_money(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches(['₹', '$'])
        .chars()
        .filter(|c| *c != ',')
        .collect();
    Decimal::from_str(cleaned.trim())
        .ok()
        .map(|d| d.round_dp(MONEY_SCALE))
}

/// Parse a whole number. Integral decimals such as `12.0` are accepted.
pub fn parse_count(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    let d = Decimal::from_str(raw).ok()?;
    if d.fract().is_zero() {
        d.to_i64()
    } else {
        None
    }
}

/// Title-case a label: `home & KITCHEN` becomes `Home & Kitchen`
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_alpha = false;
    for c in raw.trim().chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Key used to compare natural ids (`p001` and ` P001` are the same record)
pub fn natural_key(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Trimmed text, with blank treated as absent
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-01-15"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("15/01/2024"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("01-22-2024"), Some(date(2024, 1, 22)));
        assert_eq!(parse_date("01/22/2024"), Some(date(2024, 1, 22)));
    }

    #[test]
    fn test_parse_date_prefers_day_first_for_slashes() {
        // 03/04/2024 is ambiguous; DD/MM/YYYY is tried before MM/DD/YYYY
        assert_eq!(parse_date("03/04/2024"), Some(date(2024, 4, 3)));
    }

    #[test]
    fn test_parse_date_unparseable_is_missing() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2024-13-45"), None);
        assert_eq!(parse_date("31/02/2024"), None);
    }

    #[test]
    fn test_parse_date_rejects_short_years() {
        assert_eq!(parse_date("15/01/24"), None);
        assert_eq!(parse_date("01-15-24"), None);
        assert_eq!(parse_date("24-01-15"), None);
        assert_eq!(parse_date("1/15/024"), None);
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("9876543210").as_deref(), Some("+91-9876543210"));
        assert_eq!(normalize_phone("98765-43210").as_deref(), Some("+91-9876543210"));
        assert_eq!(normalize_phone("(987) 654 3210").as_deref(), Some("+91-9876543210"));
        assert_eq!(normalize_phone("+91 98765 43210").as_deref(), Some("+919876543210"));
        assert_eq!(normalize_phone("09876543210").as_deref(), Some("09876543210"));
        assert_eq!(normalize_phone("12345").as_deref(), Some("12345"));
    }

    #[test]
    fn test_normalize_phone_invalid_is_missing() {
        assert_eq!(normalize_phone(""), None);
        assert_eq!(normalize_phone("n/a"), None);
        assert_eq!(normalize_phone("+"), None);
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("45999"), Some(Decimal::new(45999, 0)));
        assert_eq!(parse_money("1,299.50"), Some(Decimal::new(129950, 2)));
        assert_eq!(parse_money("₹ 599.999"), Some(Decimal::new(60000, 2)));
        assert_eq!(parse_money("free"), None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("12"), Some(12));
        assert_eq!(parse_count("12.0"), Some(12));
        assert_eq!(parse_count("12.5"), None);
        assert_eq!(parse_count("many"), None);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("electronics"), "Electronics");
        assert_eq!(title_case("FASHION"), "Fashion");
        assert_eq!(title_case("home & kitchen"), "Home & Kitchen");
    }

    #[test]
    fn test_natural_key() {
        assert_eq!(natural_key(" p001 "), "P001");
    }
}
