//! Hex quantity handling for JSON-RPC (`0x`-prefixed, no leading zeros).

use crate::error::RpcError;

pub const WEI_PER_ETH: f64 = 1e18;
pub const WEI_PER_GWEI: f64 = 1e9;

pub fn parse_quantity(value: &str) -> Result<u128, RpcError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::InvalidResponse(format!("quantity missing 0x prefix: {value}")))?;
    if digits.is_empty() {
        return Err(RpcError::InvalidResponse("empty quantity".to_string()));
    }
    u128::from_str_radix(digits, 16)
        .map_err(|err| RpcError::InvalidResponse(format!("bad quantity {value}: {err}")))
}

pub fn to_quantity(value: u128) -> String {
    format!("{value:#x}")
}

pub fn wei_to_eth(wei: u128) -> f64 {
    wei as f64 / WEI_PER_ETH
}

pub fn wei_to_gwei(wei: u128) -> f64 {
    wei as f64 / WEI_PER_GWEI
}
