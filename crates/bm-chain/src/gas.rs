use serde::Serialize;

use crate::client::{EstimateGasCall, RpcClient};
use crate::quantity;

/// Plain native-currency transfer.
pub const TRANSFER_GAS_LIMIT: u128 = 21_000;
/// Typical marketplace interaction (list/buy), used when estimation fails.
pub const MARKETPLACE_GAS_LIMIT: u128 = 100_000;
/// Fallback when the RPC endpoint is unreachable: 0.1 gwei, typical for Base.
pub const FALLBACK_GAS_PRICE_WEI: u128 = 100_000_000;
/// Gas under this much native currency is labelled cheap in the UI.
pub const CHEAP_GAS_THRESHOLD_ETH: f64 = 0.01;

const PLATFORM_FEE_BPS: u32 = 250;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimate {
    pub gas_limit: u128,
    pub gas_price_wei: u128,
    pub gas_price_gwei: f64,
    pub estimated_cost_wei: u128,
    pub estimated_cost_eth: f64,
}

impl GasEstimate {
    fn from_parts(gas_limit: u128, gas_price_wei: u128) -> Self {
        let estimated_cost_wei = gas_limit * gas_price_wei;
        Self {
            gas_limit,
            gas_price_wei,
            gas_price_gwei: quantity::wei_to_gwei(gas_price_wei),
            estimated_cost_wei,
            estimated_cost_eth: quantity::wei_to_eth(estimated_cost_wei),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    pub item_price: f64,
    pub platform_fee: f64,
    pub platform_fee_bps: u32,
    pub royalty_fee: f64,
    pub royalty_percentage: f64,
    pub estimated_gas_cost: f64,
    pub total_cost: f64,
    pub is_cheap_gas: bool,
    /// Rough savings estimate vs. an L1 with ~5x the gas cost.
    pub savings: f64,
}

/// Current transfer-gas estimate; falls back to fixed defaults when the RPC
/// endpoint fails so the storefront can always render a price.
pub async fn transfer_estimate(client: &RpcClient) -> GasEstimate {
    match client.gas_price().await {
        Ok(gas_price) => GasEstimate::from_parts(TRANSFER_GAS_LIMIT, gas_price),
        Err(err) => {
            tracing::warn!(error = %err, "gas price fetch failed, using fallback");
            GasEstimate::from_parts(TRANSFER_GAS_LIMIT, FALLBACK_GAS_PRICE_WEI)
        }
    }
}

/// Gas estimate for a specific contract call, with the marketplace fallback
/// limit when estimation fails.
pub async fn call_estimate(client: &RpcClient, call: &EstimateGasCall) -> GasEstimate {
    let gas_limit = match client.estimate_gas(call).await {
        Ok(limit) => limit,
        Err(err) => {
            tracing::warn!(error = %err, "gas estimation failed, using marketplace fallback");
            MARKETPLACE_GAS_LIMIT
        }
    };
    let gas_price = client.gas_price().await.unwrap_or(FALLBACK_GAS_PRICE_WEI);
    GasEstimate::from_parts(gas_limit, gas_price)
}

/// Fee breakdown for a purchase at `item_price` with the given royalty.
pub fn fee_breakdown(item_price: f64, estimated_gas_cost_eth: f64, royalty_percentage: f64) -> FeeBreakdown {
    let platform_fee = item_price * f64::from(PLATFORM_FEE_BPS) / 10_000.0;
    let royalty_fee = item_price * royalty_percentage / 100.0;
    let total_cost = item_price + platform_fee + royalty_fee + estimated_gas_cost_eth;

    FeeBreakdown {
        item_price,
        platform_fee,
        platform_fee_bps: PLATFORM_FEE_BPS,
        royalty_fee,
        royalty_percentage,
        estimated_gas_cost: estimated_gas_cost_eth,
        total_cost,
        is_cheap_gas: estimated_gas_cost_eth < CHEAP_GAS_THRESHOLD_ETH,
        savings: if estimated_gas_cost_eth > 0.0 {
            estimated_gas_cost_eth * 0.8
        } else {
            0.0
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn breakdown_sums_all_components() {
        let breakdown = fee_breakdown(10.0, 0.002, 5.0);
        assert_eq!(breakdown.platform_fee, 0.25);
        assert_eq!(breakdown.royalty_fee, 0.5);
        assert!((breakdown.total_cost - 10.752).abs() < 1e-9);
        assert!(breakdown.is_cheap_gas);
    }

    #[test]
    fn expensive_gas_is_flagged() {
        let breakdown = fee_breakdown(1.0, 0.05, 0.0);
        assert!(!breakdown.is_cheap_gas);
        assert!((breakdown.savings - 0.04).abs() < 1e-9);
    }

    #[test]
    fn zero_royalty_contributes_nothing() {
        let breakdown = fee_breakdown(4.0, 0.0, 0.0);
        assert_eq!(breakdown.royalty_fee, 0.0);
        assert_eq!(breakdown.savings, 0.0);
        assert!((breakdown.total_cost - 4.1).abs() < 1e-9); // 4.0 + 2.5% platform fee
    }

    #[tokio::test]
    async fn transfer_estimate_falls_back_when_rpc_unreachable() {
        let client = RpcClient::new("http://127.0.0.1:1", Duration::from_millis(200)).unwrap();
        let estimate = transfer_estimate(&client).await;
        assert_eq!(estimate.gas_limit, TRANSFER_GAS_LIMIT);
        assert_eq!(estimate.gas_price_wei, FALLBACK_GAS_PRICE_WEI);
        assert!((estimate.gas_price_gwei - 0.1).abs() < 1e-9);
        assert!((estimate.estimated_cost_eth - 0.0000021).abs() < 1e-12);
    }
}
