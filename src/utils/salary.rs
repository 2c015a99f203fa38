//! Free-text salary normalization.
//!
//! Turns strings such as `"от 150 000 руб."`, `"3000-4000 USD"` or
//! `"до 250 000 KZT"` into a `(min, max)` pair expressed in the base currency.
//! Parsing never fails: anything it cannot make sense of yields an empty range.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_CURRENCY: &str = "RUB";

/// Phrases meaning the salary is negotiable or not disclosed.
const NEGOTIABLE_MARKERS: &[&str] = &["договор", "не указан", "negotiable", "by agreement"];

/// Ordered currency markers; the first one found in the text wins.
const CURRENCY_MARKERS: &[(&str, &str)] = &[
    ("руб", "RUB"),
    ("rub", "RUB"),
    ("rur", "RUB"),
    ("р.", "RUB"),
    ("₽", "RUB"),
    ("kzt", "KZT"),
    ("тенге", "KZT"),
    ("₸", "KZT"),
    ("usd", "USD"),
    ("$", "USD"),
    ("eur", "EUR"),
    ("€", "EUR"),
    ("uah", "UAH"),
    ("грн", "UAH"),
    ("₴", "UAH"),
    ("byn", "BYN"),
];

const FROM_WORDS: &[&str] = &["от", "from"];
const UP_TO_WORDS: &[&str] = &["до", "upto"];

const DEFAULT_RATES: &[(&str, f64)] = &[
    ("USD", 90.0),
    ("EUR", 100.0),
    ("KZT", 0.2),
    ("UAH", 2.5),
    ("BYN", 30.0),
    ("RUR", 1.0),
    ("RUB", 1.0),
];

/// Multipliers converting an amount in a currency into the base currency.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyRates {
    base: String,
    rates: HashMap<String, f64>,
}

impl Default for CurrencyRates {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_CURRENCY.to_string(),
            rates: DEFAULT_RATES
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect(),
        }
    }
}

impl CurrencyRates {
    /// Builds a table from explicit pairs. Negative or non-finite rates are rejected.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut rates = HashMap::new();
        for (code, rate) in pairs {
            let code = code.into().trim().to_uppercase();
            if !rate.is_finite() || rate < 0.0 {
                return Err(Error::Parse(format!(
                    "Invalid currency rate for {}: {}",
                    code, rate
                )));
            }
            rates.insert(code, rate);
        }
        Ok(Self {
            base: DEFAULT_BASE_CURRENCY.to_string(),
            rates,
        })
    }

    /// Parses a JSON object such as `{"USD": 90, "EUR": 100}`.
    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: HashMap<String, f64> = serde_json::from_str(raw)?;
        Self::from_pairs(parsed)
    }

    pub fn from_json_or_default(raw: &str) -> Self {
        match Self::from_json(raw) {
            Ok(rates) => rates,
            Err(e) => {
                warn!(error = %e, "Unusable currency rate table, falling back to defaults");
                Self::default()
            }
        }
    }

    pub fn with_base(mut self, base: &str) -> Self {
        self.base = base.trim().to_uppercase();
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Missing currencies convert one to one.
    pub fn rate(&self, currency: &str) -> f64 {
        self.rates.get(currency).copied().unwrap_or(1.0)
    }
}

/// Salary bounds in the base currency. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl SalaryRange {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

pub fn normalize_salary(raw: Option<&str>, rates: &CurrencyRates) -> SalaryRange {
    let Some(raw) = raw else {
        return SalaryRange::default();
    };
    let text = raw.trim().to_lowercase();
    if text.is_empty() || NEGOTIABLE_MARKERS.iter().any(|m| text.contains(m)) {
        return SalaryRange::default();
    }

    let amounts = extract_amounts(&text);
    let Some(&first) = amounts.first() else {
        return SalaryRange::default();
    };
    let smallest = amounts.iter().copied().min().unwrap_or(first);
    let largest = amounts.iter().copied().max().unwrap_or(first);

    let (has_from, has_up_to) = range_markers(&text);
    let (min, max) = match (has_from, has_up_to) {
        (true, true) if amounts.len() >= 2 => (Some(smallest), Some(largest)),
        (true, _) => (Some(first), None),
        (false, true) => (None, Some(first)),
        (false, false) if amounts.len() == 1 => (Some(first), Some(first)),
        (false, false) => (Some(smallest), Some(largest)),
    };

    let currency = detect_currency(&text).unwrap_or(rates.base());
    let rate = rates.rate(currency);

    SalaryRange {
        min: min.map(|amount| convert(amount, rate)),
        max: max.map(|amount| convert(amount, rate)),
    }
}

/// Returns the currency code of the first marker found in `text`.
pub fn detect_currency(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    CURRENCY_MARKERS
        .iter()
        .find(|(marker, _)| lowered.contains(marker))
        .map(|(_, code)| *code)
}

/// Collects every run of digits; whitespace inside a run (including
/// non-breaking and narrow spaces) is a thousands separator.
fn extract_amounts(text: &str) -> Vec<u64> {
    let mut amounts = Vec::new();
    let mut current: Option<u64> = None;
    let mut overflowed = false;

    for ch in text.chars() {
        if ch.is_ascii_digit() {
            let digit = u64::from(ch as u8 - b'0');
            let value = current.unwrap_or(0);
            match value.checked_mul(10).and_then(|v| v.checked_add(digit)) {
                Some(next) => current = Some(next),
                None => {
                    overflowed = true;
                    current = Some(value);
                }
            }
        } else if ch.is_whitespace() && current.is_some() {
            continue;
        } else {
            if let Some(value) = current.take() {
                if !overflowed {
                    amounts.push(value);
                }
            }
            overflowed = false;
        }
    }
    if let Some(value) = current {
        if !overflowed {
            amounts.push(value);
        }
    }
    amounts
}

fn range_markers(text: &str) -> (bool, bool) {
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();

    let has_from = words.iter().any(|word| FROM_WORDS.contains(word));
    let has_up_to = words.iter().any(|word| UP_TO_WORDS.contains(word))
        || words.windows(2).any(|pair| pair == ["up", "to"])
        || (has_from && words.contains(&"to"));
    (has_from, has_up_to)
}

fn convert(amount: u64, rate: f64) -> i64 {
    // `as` saturates, so huge amounts clamp instead of wrapping.
    (amount as f64 * rate).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates() -> CurrencyRates {
        CurrencyRates::default()
    }

    fn range(min: Option<i64>, max: Option<i64>) -> SalaryRange {
        SalaryRange { min, max }
    }

    #[test]
    fn missing_or_negotiable_salary_is_empty() {
        assert!(normalize_salary(None, &rates()).is_empty());
        assert!(normalize_salary(Some(""), &rates()).is_empty());
        assert!(normalize_salary(Some("   "), &rates()).is_empty());
        assert!(normalize_salary(Some("по договоренности"), &rates()).is_empty());
        assert!(normalize_salary(Some("По Договорённости"), &rates()).is_empty());
        assert!(normalize_salary(Some("з/п не указана"), &rates()).is_empty());
        assert!(normalize_salary(Some("без цифр"), &rates()).is_empty());
    }

    #[test]
    fn lower_bound_only() {
        assert_eq!(
            normalize_salary(Some("от 150 000 руб."), &rates()),
            range(Some(150_000), None)
        );
        assert_eq!(
            normalize_salary(Some("от 150\u{202f}000 RUR"), &rates()),
            range(Some(150_000), None)
        );
        assert_eq!(
            normalize_salary(Some("от 100\u{a0}000 руб."), &rates()),
            range(Some(100_000), None)
        );
        assert_eq!(
            normalize_salary(Some("от 0 руб."), &rates()),
            range(Some(0), None)
        );
    }

    #[test]
    fn upper_bound_only_leaves_min_open() {
        assert_eq!(
            normalize_salary(Some("до 250 000 RUB"), &rates()),
            range(None, Some(250_000))
        );
        assert_eq!(
            normalize_salary(Some("до 3000 EUR"), &rates()),
            range(None, Some(300_000))
        );
        assert_eq!(
            normalize_salary(Some("up to 1000 USD"), &rates()),
            range(None, Some(90_000))
        );
    }

    #[test]
    fn ranges_use_smallest_and_largest() {
        assert_eq!(
            normalize_salary(Some("150000-250000 руб."), &rates()),
            range(Some(150_000), Some(250_000))
        );
        assert_eq!(
            normalize_salary(Some("150 000-250 000 RUB"), &rates()),
            range(Some(150_000), Some(250_000))
        );
        assert_eq!(
            normalize_salary(Some("от 150000 до 250000 руб."), &rates()),
            range(Some(150_000), Some(250_000))
        );
        assert_eq!(
            normalize_salary(Some("до 250000 от 150000 руб."), &rates()),
            range(Some(150_000), Some(250_000))
        );
        assert_eq!(
            normalize_salary(Some("from 2000 to 3000 USD"), &rates()),
            range(Some(180_000), Some(270_000))
        );
    }

    #[test]
    fn single_amount_is_exact() {
        assert_eq!(
            normalize_salary(Some("100000 руб."), &rates()),
            range(Some(100_000), Some(100_000))
        );
        assert_eq!(
            normalize_salary(Some("50 000"), &rates()),
            range(Some(50_000), Some(50_000))
        );
    }

    #[test]
    fn foreign_currencies_are_converted() {
        assert_eq!(
            normalize_salary(Some("от 2000 USD"), &rates()),
            range(Some(180_000), None)
        );
        assert_eq!(
            normalize_salary(Some("3000-4000 USD"), &rates()),
            range(Some(270_000), Some(360_000))
        );
        assert_eq!(
            normalize_salary(Some("500000 KZT"), &rates()),
            range(Some(100_000), Some(100_000))
        );
        assert_eq!(
            normalize_salary(Some("300\u{202f}000 тенге"), &rates()),
            range(Some(60_000), Some(60_000))
        );
        assert_eq!(
            normalize_salary(Some("$1 500"), &rates()),
            range(Some(135_000), Some(135_000))
        );
    }

    #[test]
    fn custom_rates_and_base_currency() {
        let custom = CurrencyRates::from_json(r#"{"usd": 100, "RUB": 0.01}"#)
            .unwrap()
            .with_base("usd");
        assert_eq!(custom.base(), "USD");
        assert_eq!(
            normalize_salary(Some("от 2000 USD"), &custom),
            range(Some(200_000), None)
        );
        assert_eq!(
            normalize_salary(Some("100000 руб."), &custom),
            range(Some(1_000), Some(1_000))
        );
        // unknown currency converts one to one
        assert_eq!(
            normalize_salary(Some("до 700 EUR"), &custom),
            range(None, Some(700))
        );
    }

    #[test]
    fn zero_rate_zeroes_the_amount() {
        let zero = CurrencyRates::from_pairs([("USD", 0.0)]).unwrap();
        assert_eq!(
            normalize_salary(Some("1000-2000 USD"), &zero),
            range(Some(0), Some(0))
        );
    }

    #[test]
    fn malformed_rate_tables_fall_back_to_defaults() {
        assert_eq!(CurrencyRates::from_json_or_default("not json"), rates());
        assert_eq!(
            CurrencyRates::from_json_or_default(r#"{"USD": "ninety"}"#),
            rates()
        );
        assert_eq!(
            CurrencyRates::from_json_or_default(r#"{"USD": -1}"#),
            rates()
        );
        assert!(CurrencyRates::from_json("[1, 2]").is_err());
    }

    #[test]
    fn currency_detection_follows_table_order() {
        assert_eq!(detect_currency("100 руб"), Some("RUB"));
        assert_eq!(detect_currency("100 RUR"), Some("RUB"));
        assert_eq!(detect_currency("€500"), Some("EUR"));
        assert_eq!(detect_currency("1000 Usd"), Some("USD"));
        assert_eq!(detect_currency("100 000"), None);
    }

    #[test]
    fn overflowing_digit_runs_are_ignored() {
        let result = normalize_salary(Some("99999999999999999999999 или 5000 руб."), &rates());
        assert_eq!(result, range(Some(5_000), Some(5_000)));
        let huge = normalize_salary(Some("от 18446744073709551615 USD"), &rates());
        assert_eq!(huge, range(Some(i64::MAX), None));
    }

    #[test]
    fn bounds_are_never_inverted() {
        let samples = [
            "от 300 до 100",
            "10-5 USD",
            "до 1 от 2 до 3",
            "7 8 9 - 1 2",
            "от 1 000 000 до 10 EUR",
            "₸ 1-2-3-4",
            "from 5 to 1",
        ];
        for sample in samples {
            let result = normalize_salary(Some(sample), &rates());
            if let (Some(min), Some(max)) = (result.min, result.max) {
                assert!(min <= max, "{sample}: {min} > {max}");
            }
        }
    }
}
