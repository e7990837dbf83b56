//! Tolerant parsers for individual field texts.
//!
//! Every parser returns `None` instead of failing; callers substitute the
//! field's default.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use crate::tariff::{FuelType, TariffType};

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?\d{1,3}(?:,\d{3})+(?:\.\d+)?|-?\d+(?:\.\d+)?")
        .expect("BUG: hardcoded number regex is invalid")
});

static DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("BUG: hardcoded digits regex is invalid"));

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{4}")
        .expect("BUG: hardcoded date regex is invalid")
});

/// First number in the text, thousands separators allowed
#[must_use]
pub fn first_decimal(text: &str) -> Option<f64> {
    NUMBER_RE
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}

/// Money amount such as "£1,234.56"; currency symbols are ignored
#[must_use]
pub fn parse_currency(text: &str) -> Option<f64> {
    let stripped: String = text
        .chars()
        .filter(|c| !matches!(c, '£' | '$' | '€'))
        .collect();
    first_decimal(&stripped)
}

/// First run of digits, e.g. the contract length in "Fixed 12 months"
#[must_use]
pub fn first_int(text: &str) -> Option<u32> {
    DIGITS_RE.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Whole quantity such as "2,700 kWh"
#[must_use]
pub fn parse_quantity(text: &str) -> Option<u32> {
    first_decimal(text)
        .filter(|value| *value >= 0.0 && *value <= f64::from(u32::MAX))
        .map(|value| value.round() as u32)
}

/// "fixed" wins over "variable" when both appear
#[must_use]
pub fn classify_tariff_type(text: &str) -> Option<TariffType> {
    let lower = text.to_lowercase();
    if lower.contains("fixed") {
        Some(TariffType::Fixed)
    } else if lower.contains("variable") {
        Some(TariffType::Variable)
    } else {
        None
    }
}

/// Fuel covered by a rates table, judged from its column headers
#[must_use]
pub fn fuel_from_headers<S: AsRef<str>>(headers: &[S]) -> FuelType {
    let lower: Vec<String> = headers.iter().map(|h| h.as_ref().to_lowercase()).collect();
    let gas = lower.iter().any(|h| h.contains("gas"));
    let electric = lower.iter().any(|h| h.contains("electric"));
    match (gas, electric) {
        (true, true) => FuelType::Dual,
        (true, false) => FuelType::Gas,
        (false, true) => FuelType::Electricity,
        (false, false) => FuelType::Unknown,
    }
}

/// Date written as `%Y-%m-%d` or `%d/%m/%Y` anywhere in the text
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let found = DATE_RE.find(text)?.as_str();
    NaiveDate::parse_from_str(found, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(found, "%d/%m/%Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn currency_ignores_symbols_and_separators() {
        assert_eq!(parse_currency("£1,234.56"), Some(1234.56));
        assert_eq!(parse_currency("Exit fee: £75 per fuel"), Some(75.0));
        assert_eq!(parse_currency("€ 12"), Some(12.0));
        assert_eq!(parse_currency("No exit fees"), None);
    }

    #[test]
    fn decimals_and_quantities() {
        assert_eq!(first_decimal("24.50p per kWh"), Some(24.5));
        assert_eq!(first_decimal("53.35p/day"), Some(53.35));
        assert_eq!(parse_quantity("2,700 kWh a year"), Some(2700));
        assert_eq!(parse_quantity("n/a"), None);
    }

    #[test]
    fn tariff_type_prefers_fixed() {
        assert_eq!(classify_tariff_type("Fixed 12"), Some(TariffType::Fixed));
        assert_eq!(classify_tariff_type("Variable"), Some(TariffType::Variable));
        assert_eq!(
            classify_tariff_type("Fixed, then variable"),
            Some(TariffType::Fixed)
        );
        assert_eq!(classify_tariff_type("Tracker"), None);
    }

    #[test]
    fn fuel_follows_headers() {
        assert_eq!(fuel_from_headers(&["", "Gas", "Electricity"]), FuelType::Dual);
        assert_eq!(fuel_from_headers(&["", "Electric"]), FuelType::Electricity);
        assert_eq!(fuel_from_headers(&["Rate", "Gas"]), FuelType::Gas);
        assert_eq!(fuel_from_headers::<&str>(&[]), FuelType::Unknown);
    }

    #[test]
    fn dates_in_both_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 1);
        assert_eq!(parse_date("2026-03-01"), expected);
        assert_eq!(parse_date("Valid from 01/03/2026"), expected);
        assert_eq!(parse_date("soon"), None);
    }

    fn with_separators(value: u32) -> String {
        let digits = value.to_string();
        let mut out = String::new();
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        out
    }

    proptest! {
        #[test]
        fn parsers_never_panic(text in "\\PC*") {
            let _ = parse_currency(&text);
            let _ = first_int(&text);
            let _ = parse_quantity(&text);
            let _ = parse_date(&text);
            let _ = classify_tariff_type(&text);
        }

        #[test]
        fn formatted_amounts_parse_back(pounds in 0u32..10_000_000, pence in 0u32..100) {
            let text = format!("£{}.{pence:02} a year", with_separators(pounds));
            let parsed = parse_currency(&text).expect("amount present");
            let expected = f64::from(pounds) + f64::from(pence) / 100.0;
            prop_assert!((parsed - expected).abs() < 1e-6);
        }

        #[test]
        fn contract_length_is_first_digit_run(months in 1u32..120) {
            prop_assert_eq!(first_int(&format!("Fixed {months} months")), Some(months));
        }
    }
}
