//! Encoding and decoding of the `balanceOf` contract call.

use crate::BalanceError;
use alloy_primitives::U256;
pub use binding::token::balance_of_calldata;

/// Hex digits in a 256-bit word.
const WORD_HEX_LEN: usize = 64;

/// Decode the hex return data of `balanceOf` into an integer.
///
/// Empty (`0x`) and all-zero results are exactly zero.
pub fn decode_uint256(result: &str) -> Result<U256, BalanceError> {
    let digits = result
        .strip_prefix("0x")
        .or_else(|| result.strip_prefix("0X"))
        .unwrap_or(result);
    let significant = digits.trim_start_matches('0');

    if significant.is_empty() {
        return Ok(U256::ZERO);
    }

    if significant.len() > WORD_HEX_LEN {
        return Err(BalanceError::InvalidHex(result.to_string()));
    }

    U256::from_str_radix(significant, 16).map_err(|_| BalanceError::InvalidHex(result.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_is_zero() {
        assert_eq!(decode_uint256("0x").unwrap(), U256::ZERO);
        assert_eq!(decode_uint256("").unwrap(), U256::ZERO);
        assert_eq!(decode_uint256("0x0").unwrap(), U256::ZERO);
    }

    #[test]
    fn test_all_zero_word_is_zero() {
        let word = format!("0x{}", "0".repeat(64));
        assert_eq!(decode_uint256(&word).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_padded_word() {
        let word = "0x00000000000000000000000000000000000000000000000000000000000f4240";
        assert_eq!(decode_uint256(word).unwrap(), U256::from(1_000_000u64));
    }

    #[test]
    fn test_odd_length_result() {
        assert_eq!(decode_uint256("0x3e8").unwrap(), U256::from(1000u64));
    }

    #[test]
    fn test_invalid_hex() {
        let err = decode_uint256("0xzz").unwrap_err();
        assert_eq!(err.to_string(), "invalid hex: 0xzz");
    }

    #[test]
    fn test_oversized_result() {
        let word = format!("0x1{}", "0".repeat(64));
        assert!(decode_uint256(&word).is_err());
    }
}
