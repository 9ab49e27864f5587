//! JSON-RPC quantity encoding.

use alloy_primitives::U256;

use crate::core::{EvmError, Result};

/// Encode as a hex quantity (`0x` prefix, no leading zeros).
pub fn quantity(value: u64) -> String {
    format!("{value:#x}")
}

pub fn parse_u64(value: &str) -> Result<u64> {
    let digits = strip_prefix(value)?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| EvmError::Malformed(format!("quantity {value}: {e}")))
}

pub fn parse_u256(value: &str) -> Result<U256> {
    let digits = strip_prefix(value)?;
    U256::from_str_radix(digits, 16)
        .map_err(|e| EvmError::Malformed(format!("quantity {value}: {e}")))
}

fn strip_prefix(value: &str) -> Result<&str> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| EvmError::Malformed(format!("missing 0x prefix: {value}")))?;
    Ok(if digits.is_empty() { "0" } else { digits })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantities() {
        assert_eq!(quantity(0), "0x0");
        assert_eq!(quantity(56), "0x38");
        assert_eq!(parse_u64("0x38").unwrap(), 56);
        assert_eq!(parse_u64("0x").unwrap(), 0);
        assert_eq!(
            parse_u256("0xde0b6b3a7640000").unwrap(),
            U256::from(1_000_000_000_000_000_000u64)
        );
        assert!(parse_u64("38").is_err());
    }
}
