//! Decimal helpers for user-entered amounts and API-formatted values.
//!
//! Quote APIs exchange amounts as formatted decimal strings, users type them
//! with either decimal separator. Everything numeric goes through
//! [`fastnum`] decimals so prices are exact up to the display precision.

use alloy::primitives::{
    U256,
    utils::{UnitsError, format_units, parse_units},
};
use fastnum::{D128, UD128};

use crate::error::ToolsError;

/// Decimal places of a displayed unit price.
pub const PRICE_DECIMALS: i16 = 6;

/// Decimal places of a displayed price impact.
pub const IMPACT_DECIMALS: i16 = 2;

/// Most significant digits a user-entered amount may carry, the precision of
/// [`UD128`].
pub const MAX_AMOUNT_DIGITS: usize = 38;

/// Replaces the decimal comma with a decimal point and strips surrounding
/// whitespace.
pub fn normalize_amount(raw: &str) -> String { raw.trim().replacen(',', ".", 1) }

/// Parses a user-entered amount.
///
/// Returns `None` unless the text is a complete, positive decimal number:
/// digits with an optional fractional part. A trailing separator (`"10,"`,
/// `"10."`) is an unfinished edit and is rejected, as are signs, exponents
/// and anything else that is not a plain decimal. Amounts with more than
/// [`MAX_AMOUNT_DIGITS`] significant digits are rejected too.
pub fn parse_amount(raw: &str) -> Option<UD128> {
    let normalized = normalize_amount(raw);
    if !is_plain_decimal(&normalized) || significant_digits(&normalized) > MAX_AMOUNT_DIGITS {
        return None;
    }
    let amount = normalized.parse::<UD128>().ok()?;
    (!amount.is_zero()).then_some(amount)
}

fn significant_digits(s: &str) -> usize {
    s.bytes().filter(u8::is_ascii_digit).skip_while(|b| *b == b'0').count()
}

fn is_plain_decimal(s: &str) -> bool {
    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (s, None),
    };
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    match frac {
        Some(frac) => digits(int) && !frac.is_empty() && digits(frac),
        None => !int.is_empty() && digits(int),
    }
}

/// Output-per-input unit price of a quote, rounded to [`PRICE_DECIMALS`].
///
/// Empty if either side is not a decimal or the input is zero.
pub fn unit_price(input_formatted: &str, output_formatted: &str) -> String {
    let (Ok(input), Ok(output)) =
        (input_formatted.trim().parse::<UD128>(), output_formatted.trim().parse::<UD128>())
    else {
        return String::new();
    };
    if input.is_zero() {
        return String::new();
    }
    trim_zeros((output / input).round(PRICE_DECIMALS).to_string())
}

/// Formats a signed decimal string with exactly `places` fractional digits.
///
/// Empty if the value is empty or not a decimal.
pub fn fixed(value: &str, places: i16) -> String {
    let Ok(value) = value.trim().parse::<D128>() else {
        return String::new();
    };
    let rounded = value.round(places).to_string();
    let (int, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    if places <= 0 {
        return int.to_string();
    }
    let places = places as usize;
    let mut frac = frac.chars().take(places).collect::<String>();
    while frac.len() < places {
        frac.push('0');
    }
    format!("{int}.{frac}")
}

/// Converts a user-entered amount into token base units.
pub fn to_base_units(raw: &str, decimals: u8) -> Result<U256, ToolsError> {
    if parse_amount(raw).is_none() {
        return Err(ToolsError::InvalidArgument(format!("invalid amount: {:?}", raw)));
    }
    Ok(parse_units(&normalize_amount(raw), decimals)?.into())
}

/// Formats token base units as a decimal without trailing zeros.
pub fn from_base_units(value: U256, decimals: u8) -> Result<String, UnitsError> {
    Ok(trim_zeros(format_units(value, decimals)?))
}

fn trim_zeros(s: String) -> String {
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("10"), Some(udec128!(10)));
        assert_eq!(parse_amount(" 0.5 "), Some(udec128!(0.5)));
        assert_eq!(parse_amount("10,5"), Some(udec128!(10.5)));
        assert_eq!(parse_amount(".25"), Some(udec128!(0.25)));

        for invalid in ["", " ", "0", "0.000", "-5", "abc", "10,", "10.", "1e3", "1.2.3", "+1"] {
            assert_eq!(parse_amount(invalid), None, "{invalid:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_amount_precision() {
        let widest = "9".repeat(MAX_AMOUNT_DIGITS);
        assert!(parse_amount(&widest).is_some());
        assert!(parse_amount(&format!("0.000{}", widest)).is_some());
        assert!(parse_amount(&format!("000{}", widest)).is_some());

        assert_eq!(parse_amount(&format!("{}9", widest)), None);
        assert_eq!(parse_amount(&format!("1{}", "0".repeat(44))), None);
        assert_eq!(parse_amount(&format!("1.{}1", "0".repeat(40))), None);
    }

    #[test]
    fn test_unit_price() {
        assert_eq!(unit_price("10", "9.95"), "0.995");
        assert_eq!(unit_price("3", "1"), "0.333333");
        assert_eq!(unit_price("2", "4"), "2");
        assert_eq!(unit_price("0", "4"), "");
        assert_eq!(unit_price("", "4"), "");
    }

    #[test]
    fn test_fixed() {
        assert_eq!(fixed("0.1234", IMPACT_DECIMALS), "0.12");
        assert_eq!(fixed("1.5", IMPACT_DECIMALS), "1.50");
        assert_eq!(fixed("-0.356", IMPACT_DECIMALS), "-0.36");
        assert_eq!(fixed("", IMPACT_DECIMALS), "");
    }

    #[test]
    fn test_to_base_units() {
        assert_eq!(to_base_units("1,5", 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(to_base_units("10", 18).unwrap(), U256::from(10u64) * U256::from(10u64).pow(U256::from(18)));
        assert!(to_base_units("abc", 18).is_err());
    }

    #[test]
    fn test_from_base_units() {
        assert_eq!(from_base_units(U256::from(1_500_000u64), 6).unwrap(), "1.5");
        assert_eq!(from_base_units(U256::from(10u64).pow(U256::from(24)), 18).unwrap(), "1000000");
        assert_eq!(from_base_units(U256::ZERO, 18).unwrap(), "0");
    }
}
