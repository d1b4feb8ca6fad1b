//! Scale-8 money arithmetic
//!
//! Every price, quantity and balance in the system is a decimal with exactly
//! 8 fractional digits. Multiplication truncates toward zero at scale 8;
//! nothing in this crate touches binary floating point.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use thiserror::Error;

/// Number of fractional digits carried by all money and quantity values.
pub const SCALE: u32 = 8;

/// Commission charged to the buyer on the executed notional: 1.5%.
pub const COMMISSION_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 3);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("Invalid decimal: {0}")]
    InvalidDecimal(String),
}

/// Truncate a value to scale 8, toward zero.
#[inline]
pub fn scale8(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SCALE, RoundingStrategy::ToZero)
}

/// Multiply two scale-8 values, truncating the product to scale 8.
#[inline]
pub fn mul(a: Decimal, b: Decimal) -> Decimal {
    scale8(a * b)
}

/// Buyer commission on a notional, same truncation rule as `mul`.
#[inline]
pub fn commission(notional: Decimal) -> Decimal {
    mul(notional, COMMISSION_RATE)
}

/// Parse a decimal from its string form.
///
/// Fails only on malformed (non-numeric) input; values with more than 8
/// fractional digits are truncated toward zero.
pub fn parse(input: &str) -> Result<Decimal, ArithmeticError> {
    let trimmed = input.trim();
    Decimal::from_str(trimmed)
        .map(scale8)
        .map_err(|_| ArithmeticError::InvalidDecimal(trimmed.to_string()))
}

/// Format a value with exactly 8 fractional digits, e.g. `50000.00000000`.
pub fn format_fixed(value: Decimal) -> String {
    format!("{:.prec$}", value, prec = SCALE as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_commission_rate_value() {
        assert_eq!(COMMISSION_RATE, d("0.015"));
    }

    #[test]
    fn test_mul_truncates_toward_zero() {
        // 0.00000001 * 0.1 = 0.000000001 -> truncates to 0
        assert_eq!(mul(d("0.00000001"), d("0.1")), Decimal::ZERO);
        // 1.23456789 truncates, never rounds up
        assert_eq!(mul(d("0.123456789"), d("1")), d("0.12345678"));
    }

    #[test]
    fn test_mul_exact_products() {
        assert_eq!(mul(d("50000"), d("1")), d("50000"));
        assert_eq!(mul(d("50000"), d("0.5")), d("25000"));
    }

    #[test]
    fn test_commission_examples() {
        // 1.5% of 50000 = 750
        assert_eq!(commission(d("50000")), d("750"));
        // 1.5% of 48000 = 720
        assert_eq!(commission(d("48000")), d("720"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse("abc").is_err());
        assert!(parse("1.2.3").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_parse_accepts_numeric() {
        assert_eq!(parse("50000").unwrap(), d("50000"));
        assert_eq!(parse(" 0.5 ").unwrap(), d("0.5"));
        // Excess precision truncates toward zero
        assert_eq!(parse("0.123456789").unwrap(), d("0.12345678"));
    }

    #[test]
    fn test_format_fixed_eight_digits() {
        assert_eq!(format_fixed(d("50000")), "50000.00000000");
        assert_eq!(format_fixed(d("0.5")), "0.50000000");
        assert_eq!(format_fixed(d("49250")), "49250.00000000");
    }

    #[test]
    fn test_reserve_refund_identity() {
        // reserve = notional + commission; refunding the same expression on
        // the full remaining amount restores the balance exactly.
        let price = d("50000");
        let amount = d("0.33333333");
        let notional = mul(price, amount);
        let required = notional + commission(notional);

        let balance = d("100000");
        let after_reserve = balance - required;
        let after_refund = after_reserve + notional + commission(notional);
        assert_eq!(after_refund, balance);
    }
}
