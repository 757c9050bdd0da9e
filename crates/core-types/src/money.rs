//! Monetary values at the API and display boundaries.
//!
//! The canonical in-memory representation is `rust_decimal::Decimal` holding
//! whole currency units with exact fractional cents. The marketplace has been
//! seen to send amounts as JSON strings, integers and floats, so ingress
//! accepts all three. Floats are converted through their shortest decimal text
//! and never through binary arithmetic. Rounding to cents happens only in
//! `round_for_display` / `format_currency`.

use crate::error::CoreError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Number of fractional digits shown to users.
pub const DISPLAY_DP: u32 = 2;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawAmount {
    fn into_decimal(self) -> Result<Decimal, CoreError> {
        match self {
            RawAmount::Int(value) => Ok(Decimal::from(value)),
            RawAmount::Float(value) => {
                if !value.is_finite() {
                    return Err(CoreError::InvalidInput(
                        "amount".to_string(),
                        format!("non-finite number {}", value),
                    ));
                }
                parse_amount(&value.to_string())
            }
            RawAmount::Text(text) => parse_amount(&text),
        }
    }
}

/// Parses a textual amount such as `"12.50"` or `"-3"`.
pub fn parse_amount(text: &str) -> Result<Decimal, CoreError> {
    let trimmed = text.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map(|d| d.normalize())
        .map_err(|e| CoreError::InvalidInput("amount".to_string(), format!("'{}': {}", text, e)))
}

/// Serde helper for amounts that may arrive as a string, an integer or a float.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    RawAmount::deserialize(deserializer)?
        .into_decimal()
        .map_err(serde::de::Error::custom)
}

/// Like [`deserialize_amount`], but `null` and absent fields become `None`.
pub fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawAmount>::deserialize(deserializer)?
        .map(RawAmount::into_decimal)
        .transpose()
        .map_err(serde::de::Error::custom)
}

/// Rounds a value to cents. Only call this at the display boundary.
pub fn round_for_display(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DISPLAY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats a value as US dollars, e.g. `$1,234.50` or `-$12.00`.
pub fn format_currency(value: Decimal) -> String {
    let rounded = round_for_display(value);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let digits = format!("{:.2}", rounded.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    format!("{}${}.{}", sign, group_thousands(whole), cents)
}

fn group_thousands(whole: &str) -> String {
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(deserialize_with = "deserialize_amount")]
        amount: Decimal,
        #[serde(default, deserialize_with = "deserialize_optional_amount")]
        balance: Option<Decimal>,
    }

    #[test]
    fn test_ingress_accepts_strings_integers_and_floats() {
        let w: Wrapper = serde_json::from_str(r#"{"amount": "12.50"}"#).unwrap();
        assert_eq!(w.amount, dec!(12.5));
        assert_eq!(w.balance, None);

        let w: Wrapper = serde_json::from_str(r#"{"amount": 30, "balance": null}"#).unwrap();
        assert_eq!(w.amount, dec!(30));
        assert_eq!(w.balance, None);

        let w: Wrapper = serde_json::from_str(r#"{"amount": 0.1, "balance": -7.25}"#).unwrap();
        assert_eq!(w.amount, dec!(0.1));
        assert_eq!(w.balance, Some(dec!(-7.25)));
    }

    #[test]
    fn test_float_ingress_does_not_drift() {
        let values = ["0.1", "0.2", "0.3"];
        let total: Decimal = values
            .iter()
            .map(|v| serde_json::from_str::<Wrapper>(&format!(r#"{{"amount": {}}}"#, v)).unwrap().amount)
            .sum();
        assert_eq!(total, dec!(0.6));
    }

    #[test]
    fn test_ingress_rejects_garbage() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"amount": "twelve"}"#).is_err());
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn test_round_for_display_is_midpoint_away_from_zero() {
        assert_eq!(round_for_display(dec!(1.005)), dec!(1.01));
        assert_eq!(round_for_display(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_for_display(dec!(2.004)), dec!(2.00));
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec!(0)), "$0.00");
        assert_eq!(format_currency(dec!(120)), "$120.00");
        assert_eq!(format_currency(dec!(1234.5)), "$1,234.50");
        assert_eq!(format_currency(dec!(-1234567.891)), "-$1,234,567.89");
        assert_eq!(format_currency(dec!(-0.001)), "$0.00");
    }
}
