//! Conversion between atomic token amounts and human decimal strings.

use alloy_primitives::U256;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AmountError {
    #[error("invalid amount: {0}")]
    Invalid(String),

    #[error("amount {amount} has more than {decimals} fractional digits")]
    TooPrecise { amount: String, decimals: u8 },
}

/// Minimum fractional digits kept after trimming trailing zeros.
const MIN_FRACTION_DIGITS: usize = 2;

fn scale(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

/// Format an atomic amount as a decimal string.
///
/// The fractional part is zero-padded to `decimals` digits and trailing zeros
/// are trimmed, keeping at least two digits. A zero fraction keeps all
/// `decimals` digits: `0` at 6 decimals is `0.000000`, `1000` is `0.001`.
pub fn to_human(raw: U256, decimals: u8) -> String {
    if decimals == 0 {
        return raw.to_string();
    }

    let divisor = scale(decimals);
    let whole = raw / divisor;
    let frac = raw % divisor;
    let width = usize::from(decimals);

    if frac.is_zero() {
        return format!("{whole}.{}", "0".repeat(width));
    }

    let padded = format!("{:0>width$}", frac.to_string());
    let trimmed = padded.trim_end_matches('0');
    let fraction = if trimmed.len() < MIN_FRACTION_DIGITS {
        &padded[..MIN_FRACTION_DIGITS.min(width)]
    } else {
        trimmed
    };

    format!("{whole}.{fraction}")
}

/// Parse a base-10 atomic amount such as the `amount` of a payment option.
pub fn parse_atomic(raw: &str) -> Result<U256, AmountError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::Invalid(raw.to_string()));
    }

    U256::from_str_radix(raw, 10).map_err(|_| AmountError::Invalid(raw.to_string()))
}

/// Scale a human decimal string back to atomic units.
pub fn to_atomic(human: &str, decimals: u8) -> Result<U256, AmountError> {
    let human = human.trim();
    let (whole, fraction) = human.split_once('.').unwrap_or((human, ""));

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > usize::from(decimals) {
        return Err(AmountError::TooPrecise {
            amount: human.to_string(),
            decimals,
        });
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::Invalid(human.to_string()));
    }

    let whole = parse_atomic(whole).map_err(|_| AmountError::Invalid(human.to_string()))?;
    let padded = format!("{fraction:0<width$}", width = usize::from(decimals));
    let fraction = if padded.is_empty() {
        U256::ZERO
    } else {
        parse_atomic(&padded)?
    };

    whole
        .checked_mul(scale(decimals))
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(|| AmountError::Invalid(human.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn human(raw: &str, decimals: u8) -> String {
        to_human(parse_atomic(raw).unwrap(), decimals)
    }

    #[test]
    fn test_zero_keeps_full_precision() {
        assert_eq!(human("0", 6), "0.000000");
        assert_eq!(human("5000000", 6), "5.000000");
    }

    #[test]
    fn test_trailing_zeros_trimmed() {
        assert_eq!(human("1000", 6), "0.001");
        assert_eq!(human("1500000", 6), "1.50");
        assert_eq!(human("1234567", 6), "1.234567");
        assert_eq!(human("10000", 6), "0.01");
    }

    #[test]
    fn test_minimum_two_fraction_digits() {
        assert_eq!(human("100000", 6), "0.10");
        assert_eq!(human("1", 1), "0.1");
    }

    #[test]
    fn test_zero_decimals() {
        assert_eq!(human("42", 0), "42");
    }

    #[test]
    fn test_eighteen_decimals() {
        assert_eq!(human("1000000000000000000", 18), "1.000000000000000000");
        assert_eq!(human("1", 18), "0.000000000000000001");
    }

    #[test]
    fn test_round_trip() {
        let amounts = [
            "0",
            "1",
            "9",
            "10",
            "1000",
            "100000",
            "999999",
            "1000000",
            "1234500",
            "340282366920938463463374607431768211455",
        ];
        for decimals in [0u8, 1, 2, 6, 8, 18] {
            for raw in amounts {
                let atomic = parse_atomic(raw).unwrap();
                let rendered = to_human(atomic, decimals);
                assert_eq!(
                    to_atomic(&rendered, decimals).unwrap(),
                    atomic,
                    "{raw} at {decimals} decimals rendered as {rendered}"
                );
            }
        }
    }

    #[test]
    fn test_to_atomic_rejects_excess_precision() {
        assert_eq!(
            to_atomic("0.0000001", 6),
            Err(AmountError::TooPrecise {
                amount: "0.0000001".to_string(),
                decimals: 6
            })
        );
        assert_eq!(to_atomic("1.500000000", 6).unwrap(), U256::from(1_500_000u64));
    }

    #[test]
    fn test_parse_atomic_rejects_garbage() {
        assert!(parse_atomic("").is_err());
        assert!(parse_atomic("-1").is_err());
        assert!(parse_atomic("0x10").is_err());
        assert!(to_atomic("1.2.3", 6).is_err());
    }
}
