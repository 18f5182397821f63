//! Base-unit normalization for display.
//!
//! Integer arithmetic only. Wei balances round half-up to three decimals;
//! satoshi balances render exactly with trailing zeros trimmed.

use alloy_primitives::U256;

pub const SATS_PER_BTC: u64 = 100_000_000;

/// 0.01 of the EVM native unit, in wei.
pub const DEFAULT_EVM_TRANSFER_WEI: u64 = 10_000_000_000_000_000;

/// Minimal BTC transfer (1 sat).
pub const DEFAULT_BTC_TRANSFER_SATS: u64 = 1;

const WEI_PER_MILLI: u64 = 1_000_000_000_000_000;
const HALF_MILLI: u64 = WEI_PER_MILLI / 2;

/// Wei → native units with exactly three decimals, e.g. `"0.012"`.
pub fn format_wei_3dp(wei: U256) -> String {
    let millis = wei.saturating_add(U256::from(HALF_MILLI)) / U256::from(WEI_PER_MILLI);
    let whole = millis / U256::from(1000u64);
    let frac = (millis % U256::from(1000u64)).as_limbs()[0];
    format!("{}.{:03}", whole, frac)
}

/// Satoshis → BTC without trailing zeros, e.g. `250000` → `"0.0025"`.
pub fn format_sats(sats: u64) -> String {
    let whole = sats / SATS_PER_BTC;
    let frac = sats % SATS_PER_BTC;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:08}", frac);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Satoshis → BTC with all eight decimals (wallet RPC amount argument).
pub fn format_btc_amount(sats: u64) -> String {
    format!("{}.{:08}", sats / SATS_PER_BTC, sats % SATS_PER_BTC)
}

/// `0x` hex quantity as used by Ethereum JSON-RPC.
pub fn parse_hex_quantity(raw: &str) -> Option<U256> {
    let digits = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))?;
    if digits.is_empty() {
        return Some(U256::ZERO);
    }
    U256::from_str_radix(digits, 16).ok()
}

pub fn to_hex_quantity(value: U256) -> String {
    format!("0x{:x}", value)
}

/// `0x1234...abcd` style shortening. Short or empty input is returned as is.
pub fn truncate_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
