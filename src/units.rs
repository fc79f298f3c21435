//! Conversion between smallest-unit integers and display strings.
//!
//! Balances arrive from providers as raw integers (wei for Ether). The view shows
//! them in whole units with trailing zeros trimmed, so `10^18` wei renders as `"1"`
//! and `5 * 10^17` wei as `"0.5"`.

use alloy_primitives::U256;

use crate::error::{Result, WalletError};

/// Decimal scale of Ether.
pub const ETHER_DECIMALS: u8 = 18;

/// Display value of an empty or reset balance.
pub const ZERO_BALANCE: &str = "0";

/// Largest decimal scale that still fits a power of ten in a `U256`.
pub const MAX_DECIMALS: u8 = 77;

/// Formats a smallest-unit amount as a decimal string with `decimals` fractional digits,
/// trimming trailing zeros (and the separator when nothing remains after it).
pub fn format_units(amount: U256, decimals: u8) -> Result<String> {
    if decimals > MAX_DECIMALS {
        return Err(WalletError::config(format!(
            "Unsupported decimal scale {decimals}; the maximum is {MAX_DECIMALS}"
        )));
    }
    if decimals == 0 {
        return Ok(amount.to_string());
    }

    let scale = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / scale;
    let fraction = amount % scale;

    if fraction.is_zero() {
        return Ok(whole.to_string());
    }

    let digits = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    Ok(format!("{}.{}", whole, digits.trim_end_matches('0')))
}

/// Parses a JSON-RPC hex quantity such as `"0x6f05b59d3b20000"`.
pub fn parse_quantity(value: &str) -> Result<U256> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| WalletError::query(format!("Quantity '{value}' is missing the 0x prefix")))?;

    if digits.is_empty() {
        return Err(WalletError::query("Quantity '0x' has no digits"));
    }

    U256::from_str_radix(digits, 16)
        .map_err(|e| WalletError::query(format!("Invalid quantity '{value}': {e}")))
}
