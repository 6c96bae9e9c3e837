use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bm_chain::explorer::ExplorerLink;
use bm_chain::{fee_breakdown, gas, FeeBreakdown, GasEstimate};
use bm_core::metrics;
use serde::{Deserialize, Serialize};

use crate::{ApiError, ApiResult, AppState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RpcHealthResponse {
    pub success: bool,
    pub rpc_url: String,
    pub client_version: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccountResponse {
    pub success: bool,
    pub address: String,
    pub balance: String,
    pub balance_wei: String,
    pub explorer: ExplorerLink,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GasQuery {
    /// Item price in native currency; when present the response includes a
    /// full fee breakdown.
    pub price: Option<f64>,
    pub royalty: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GasResponse {
    pub success: bool,
    pub estimate: GasEstimate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<FeeBreakdown>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TxQuery {
    /// Block until the transaction is mined or the poll ceiling is hit.
    pub wait: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TxResponse {
    pub success: bool,
    pub hash: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<String>,
    pub explorer: ExplorerLink,
}

pub(crate) async fn base_health(
    State(state): State<AppState>,
) -> ApiResult<Json<RpcHealthResponse>> {
    let client_version = match state.rpc.client_version().await {
        Ok(version) => {
            metrics::inc_rpc_request(crate::SERVICE_NAME, "web3_clientVersion", metrics::RPC_RESULT_OK);
            version
        }
        Err(err) => {
            metrics::inc_rpc_request(
                crate::SERVICE_NAME,
                "web3_clientVersion",
                metrics::RPC_RESULT_ERROR,
            );
            return Err(ApiError::from(err));
        }
    };

    Ok(Json(RpcHealthResponse {
        success: true,
        rpc_url: state.rpc.url().to_string(),
        client_version,
    }))
}

fn validate_evm_address(address: &str) -> ApiResult<()> {
    let hex_part = address.strip_prefix("0x").ok_or(())
        .and_then(|rest| if rest.len() == 40 { Ok(rest) } else { Err(()) })
        .map_err(|_| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_ADDRESS",
                "Valid EVM address required",
            )
        })?;
    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "INVALID_ADDRESS",
            "Valid EVM address required",
        ));
    }
    Ok(())
}

pub(crate) async fn base_account(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Json<AccountResponse>> {
    validate_evm_address(&address)?;

    let balance = match state.rpc.balance(&address).await {
        Ok(balance) => {
            metrics::inc_rpc_request(crate::SERVICE_NAME, "eth_getBalance", metrics::RPC_RESULT_OK);
            balance
        }
        Err(err) => {
            metrics::inc_rpc_request(
                crate::SERVICE_NAME,
                "eth_getBalance",
                metrics::RPC_RESULT_ERROR,
            );
            return Err(ApiError::from(err));
        }
    };

    let explorer = state.explorer.address_link(&address);
    Ok(Json(AccountResponse {
        success: true,
        balance: format!("{:.4}", balance.eth),
        balance_wei: balance.wei.to_string(),
        address,
        explorer,
    }))
}

pub(crate) async fn base_gas(
    State(state): State<AppState>,
    Query(query): Query<GasQuery>,
) -> ApiResult<Json<GasResponse>> {
    let royalty = query.royalty.unwrap_or(0.0);
    if !(0.0..=100.0).contains(&royalty) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "INVALID_ROYALTY",
            "Royalty must be between 0 and 100",
        ));
    }

    // Falls back to fixed defaults when the endpoint is down, so the
    // storefront can always show a price.
    let estimate = gas::transfer_estimate(&state.rpc).await;
    let breakdown = query
        .price
        .filter(|price| *price > 0.0)
        .map(|price| fee_breakdown(price, estimate.estimated_cost_eth, royalty));

    Ok(Json(GasResponse {
        success: true,
        estimate,
        breakdown,
    }))
}

const RECEIPT_MAX_POLLS: u32 = 30;
const RECEIPT_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

pub(crate) async fn base_tx(
    State(state): State<AppState>,
    Path(hash): Path<String>,
    Query(query): Query<TxQuery>,
) -> ApiResult<Json<TxResponse>> {
    if !hash.starts_with("0x") || hash.len() != 66 {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "INVALID_TX_HASH",
            "Valid transaction hash required",
        ));
    }

    let receipt = if query.wait.unwrap_or(false) {
        match bm_chain::poll_receipt(&state.rpc, &hash, RECEIPT_MAX_POLLS, RECEIPT_POLL_INTERVAL)
            .await
        {
            Ok(bm_chain::PollOutcome::Mined(receipt)) => {
                metrics::inc_rpc_request(
                    crate::SERVICE_NAME,
                    "eth_getTransactionReceipt",
                    metrics::RPC_RESULT_OK,
                );
                Some(receipt)
            }
            Ok(bm_chain::PollOutcome::Pending) => None,
            Err(err) => {
                metrics::inc_rpc_request(
                    crate::SERVICE_NAME,
                    "eth_getTransactionReceipt",
                    metrics::RPC_RESULT_ERROR,
                );
                return Err(ApiError::from(err));
            }
        }
    } else {
        match state.rpc.transaction_receipt(&hash).await {
            Ok(receipt) => {
                metrics::inc_rpc_request(
                    crate::SERVICE_NAME,
                    "eth_getTransactionReceipt",
                    metrics::RPC_RESULT_OK,
                );
                receipt
            }
            Err(err) => {
                metrics::inc_rpc_request(
                    crate::SERVICE_NAME,
                    "eth_getTransactionReceipt",
                    metrics::RPC_RESULT_ERROR,
                );
                return Err(ApiError::from(err));
            }
        }
    };

    let explorer = state.explorer.tx_link(&hash);
    let response = match receipt {
        Some(receipt) => TxResponse {
            success: true,
            hash,
            status: if receipt.succeeded { "success" } else { "failed" },
            block_number: Some(receipt.block_number),
            gas_used: receipt.gas_used.map(|gas| gas.to_string()),
            explorer,
        },
        None => TxResponse {
            success: true,
            hash,
            status: "pending",
            block_number: None,
            gas_used: None,
            explorer,
        },
    };

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evm_address_validation() {
        assert!(validate_evm_address("0xD15D1766cd7c2D4FbcEb4f015CbD54058304d682").is_ok());
        assert!(validate_evm_address("D15D1766cd7c2D4FbcEb4f015CbD54058304d682").is_err());
        assert!(validate_evm_address("0x123").is_err());
        assert!(validate_evm_address("0xZZ5D1766cd7c2D4FbcEb4f015CbD54058304d682").is_err());
    }
}
