//! # Token Amounts
//!
//! Exact conversion between user-facing decimal strings and smallest-unit integers.
//!
//! No floating point is involved: the decimal string is split into integer and
//! fractional digits and scaled by `10^decimals` as an integer. Input with more
//! significant fractional digits than the token supports is rejected rather than
//! silently truncated.
//!
//! ```rust
//! use alloy_primitives::U256;
//! use lib_core::model::amount::{format_units, parse_units};
//!
//! let raw = parse_units("3000.50", 6).unwrap();
//! assert_eq!(raw, U256::from(3_000_500_000u64));
//! assert_eq!(format_units(raw, 6), "3000.5");
//! ```

use alloy_primitives::U256;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::error::AppError;

/// Largest decimals value accepted for a token.
///
/// `U256` holds 77 decimal digits; 36 leaves room for realistic integer parts.
pub const MAX_DECIMALS: u8 = 36;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount cannot be empty")]
    Empty,

    #[error("'{0}' is not a plain decimal number")]
    Malformed(String),

    #[error("'{value}' has more than {decimals} fractional digits")]
    TooPrecise { value: String, decimals: u8 },

    #[error("amount must be greater than zero")]
    NotPositive,

    #[error("'{0}' does not fit in 256 bits")]
    Overflow(String),

    #[error("decimals must be between 0 and {}, got {}", MAX_DECIMALS, .0)]
    DecimalsOutOfRange(u8),
}

impl From<AmountError> for AppError {
    fn from(err: AmountError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Convert a decimal string into smallest units of a token with `decimals` places.
///
/// Accepts `123`, `123.45` and `0.001`. Signs, exponents, separators and a bare
/// trailing or leading `.` are rejected. Trailing fractional zeros beyond the
/// token precision are harmless (`"1.500"` at 1 decimal is `15`).
pub fn parse_units(value: &str, decimals: u8) -> Result<U256, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::DecimalsOutOfRange(decimals));
    }

    let value = value.trim();
    if value.is_empty() {
        return Err(AmountError::Empty);
    }

    let (int_part, frac_part) = match value.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (value, None),
    };

    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(int_part) || frac_part.is_some_and(|f| !is_digits(f)) {
        return Err(AmountError::Malformed(value.to_string()));
    }

    let frac = frac_part.unwrap_or("").trim_end_matches('0');
    if frac.len() > decimals as usize {
        return Err(AmountError::TooPrecise { value: value.to_string(), decimals });
    }

    let mut digits = String::with_capacity(int_part.len() + decimals as usize);
    digits.push_str(int_part);
    digits.push_str(frac);
    digits.extend(std::iter::repeat('0').take(decimals as usize - frac.len()));

    U256::from_str_radix(&digits, 10).map_err(|_| AmountError::Overflow(value.to_string()))
}

/// Render smallest units as a decimal string.
///
/// Trailing fractional zeros are trimmed but one fractional digit is kept
/// (`1.0`, `3000.5`). With zero decimals the plain integer is returned.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    if decimals == 0 {
        return digits;
    }

    let decimals = decimals as usize;
    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };

    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac = frac_part.trim_end_matches('0');
    let frac = if frac.is_empty() { "0" } else { frac };
    format!("{}.{}", int_part, frac)
}

/// A user-facing amount together with its smallest-unit representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmountSpec {
    /// Canonical decimal form (see [`format_units`])
    pub decimal: String,
    /// Smallest-unit integer
    pub smallest_unit: U256,
    pub decimals: u8,
}

impl AmountSpec {
    /// Parse a strictly positive amount.
    pub fn parse(value: &str, decimals: u8) -> Result<Self, AmountError> {
        let smallest_unit = parse_units(value, decimals)?;
        if smallest_unit.is_zero() {
            return Err(AmountError::NotPositive);
        }
        Ok(Self::from_smallest_unit(smallest_unit, decimals))
    }

    pub fn from_smallest_unit(smallest_unit: U256, decimals: u8) -> Self {
        Self {
            decimal: format_units(smallest_unit, decimals),
            smallest_unit,
            decimals,
        }
    }
}

impl fmt::Display for AmountSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.decimal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pow10(exp: usize) -> U256 {
        U256::from(10u64).pow(U256::from(exp))
    }

    #[test]
    fn test_parse_whole_ether() {
        assert_eq!(parse_units("1.0", 18).unwrap(), pow10(18));
        assert_eq!(parse_units("1", 18).unwrap(), pow10(18));
    }

    #[test]
    fn test_parse_usdc_fraction() {
        assert_eq!(parse_units("3000.50", 6).unwrap(), U256::from(3_000_500_000u64));
        assert_eq!(parse_units("0.000001", 6).unwrap(), U256::from(1u64));
    }

    #[test]
    fn test_parse_rejects_excess_precision() {
        let err = parse_units("0.0000001", 6).unwrap_err();
        assert!(matches!(err, AmountError::TooPrecise { decimals: 6, .. }));
        // zeros past the precision carry no value
        assert_eq!(parse_units("1.5000000", 1).unwrap(), U256::from(15u64));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", " ", "-1", "+1", "1e18", "1.", ".5", "1.2.3", "1,000", "abc", "0x10"] {
            assert!(parse_units(bad, 18).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_rejects_overflow() {
        let huge = "9".repeat(70);
        assert!(matches!(parse_units(&huge, 18), Err(AmountError::Overflow(_))));
    }

    #[test]
    fn test_parse_rejects_decimals_out_of_range() {
        assert_eq!(parse_units("1", 37).unwrap_err(), AmountError::DecimalsOutOfRange(37));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(pow10(18), 18), "1.0");
        assert_eq!(format_units(U256::from(3_000_500_000u64), 6), "3000.5");
        assert_eq!(format_units(U256::from(1u64), 6), "0.000001");
        assert_eq!(format_units(U256::ZERO, 6), "0.0");
        assert_eq!(format_units(U256::from(42u64), 0), "42");
    }

    #[test]
    fn test_round_trip_preserves_canonical_strings() {
        let cases = [
            ("1.0", 18u8),
            ("0.000000000000000001", 18),
            ("3000.5", 6),
            ("123456789.123456", 6),
            ("7", 0),
            ("0.1", 1),
        ];
        for (value, decimals) in cases {
            let raw = parse_units(value, decimals).unwrap();
            assert_eq!(format_units(raw, decimals), value, "round trip of {value} at {decimals}");
        }
    }

    #[test]
    fn test_round_trip_normalizes_equivalent_inputs() {
        let raw = parse_units("0003000.500", 6).unwrap();
        assert_eq!(format_units(raw, 6), "3000.5");
        assert_eq!(parse_units(&format_units(raw, 6), 6).unwrap(), raw);
    }

    #[test]
    fn test_amount_spec_requires_positive() {
        assert_eq!(AmountSpec::parse("0.0", 18).unwrap_err(), AmountError::NotPositive);

        let spec = AmountSpec::parse("2.5", 18).unwrap();
        assert_eq!(spec.decimal, "2.5");
        assert_eq!(spec.smallest_unit, U256::from(25u64) * pow10(17));
    }
}
