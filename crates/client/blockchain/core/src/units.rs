//! Fixed-point token amount formatting.

use crate::types::U256;

/// Decimals used by the platform token and the native currency.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Render `amount / 10^decimals` as a decimal string.
///
/// Trailing fractional zeros are trimmed but at least one fractional digit is
/// kept, so zero renders as `"0.0"` and one token as `"1.0"`.
pub fn format_units(amount: U256, decimals: u8) -> String {
    let scale = U256::from(10u8).pow(U256::from(decimals));
    let whole = amount / scale;
    let frac = amount % scale;

    if decimals == 0 {
        return format!("{whole}.0");
    }

    let mut frac_digits = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    while frac_digits.len() > 1 && frac_digits.ends_with('0') {
        frac_digits.pop();
    }
    format!("{whole}.{frac_digits}")
}

/// Parse a decimal string into base units. Returns `None` for malformed
/// input or more fractional digits than `decimals`.
pub fn parse_units(value: &str, decimals: u8) -> Option<U256> {
    let value = value.trim();
    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > decimals as usize
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !frac.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let scale = U256::from(10u8).pow(U256::from(decimals));
    let whole = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10).ok()?
    };
    let frac = if frac.is_empty() {
        U256::ZERO
    } else {
        let padded = format!("{frac:0<width$}", width = decimals as usize);
        U256::from_str_radix(&padded, 10).ok()?
    };
    whole.checked_mul(scale)?.checked_add(frac)
}

/// `value` whole tokens expressed in base units.
pub fn tokens(value: u64) -> U256 {
    U256::from(value) * U256::from(10u8).pow(U256::from(DEFAULT_DECIMALS))
}
