use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::RpcError;
use crate::quantity;

/// Thin JSON-RPC 2.0 client for an EVM endpoint ("Base"-compatible).
pub struct RpcClient {
    http: Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Debug, Clone)]
pub struct Balance {
    pub wei: u128,
    pub eth: f64,
}

#[derive(Debug, Clone)]
pub struct EstimateGasCall {
    pub from: Option<String>,
    pub to: String,
    pub data: String,
}

#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub succeeded: bool,
    pub block_number: u64,
    pub gas_used: Option<u128>,
}

#[derive(Deserialize)]
struct RpcEnvelope {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let envelope: RpcEnvelope = response.json().await?;

        if let Some(error) = envelope.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        envelope
            .result
            .ok_or_else(|| RpcError::InvalidResponse(format!("{method}: missing result")))
    }

    pub async fn client_version(&self) -> Result<String, RpcError> {
        let result = self.call("web3_clientVersion", json!([])).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RpcError::InvalidResponse("client version is not a string".to_string()))
    }

    pub async fn balance(&self, address: &str) -> Result<Balance, RpcError> {
        let result = self
            .call("eth_getBalance", json!([address, "latest"]))
            .await?;
        let hex = result
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse("balance is not a string".to_string()))?;
        let wei = quantity::parse_quantity(hex)?;
        Ok(Balance {
            wei,
            eth: quantity::wei_to_eth(wei),
        })
    }

    pub async fn gas_price(&self) -> Result<u128, RpcError> {
        let result = self.call("eth_gasPrice", json!([])).await?;
        let hex = result
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse("gas price is not a string".to_string()))?;
        quantity::parse_quantity(hex)
    }

    pub async fn estimate_gas(&self, call: &EstimateGasCall) -> Result<u128, RpcError> {
        const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
        let from = call.from.as_deref().unwrap_or(ZERO_ADDRESS);
        let result = self
            .call(
                "eth_estimateGas",
                json!([{ "from": from, "to": call.to, "data": call.data }]),
            )
            .await?;
        let hex = result
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse("gas estimate is not a string".to_string()))?;
        quantity::parse_quantity(hex)
    }

    /// `None` while the transaction is still pending.
    pub async fn transaction_receipt(&self, hash: &str) -> Result<Option<TxReceipt>, RpcError> {
        let result = self
            .call("eth_getTransactionReceipt", json!([hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        parse_receipt(&result).map(Some)
    }
}

pub(crate) fn parse_receipt(value: &Value) -> Result<TxReceipt, RpcError> {
    let status = value
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::InvalidResponse("receipt missing status".to_string()))?;
    let block_number = value
        .get("blockNumber")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::InvalidResponse("receipt missing blockNumber".to_string()))?;
    let gas_used = value
        .get("gasUsed")
        .and_then(Value::as_str)
        .map(quantity::parse_quantity)
        .transpose()?;

    Ok(TxReceipt {
        succeeded: status == "0x1",
        block_number: quantity::parse_quantity(block_number)? as u64,
        gas_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_parses_success_and_failure() {
        let mined = serde_json::json!({
            "status": "0x1",
            "blockNumber": "0x1b4",
            "gasUsed": "0x5208",
        });
        let receipt = parse_receipt(&mined).unwrap();
        assert!(receipt.succeeded);
        assert_eq!(receipt.block_number, 436);
        assert_eq!(receipt.gas_used, Some(21_000));

        let reverted = serde_json::json!({
            "status": "0x0",
            "blockNumber": "0x1b5",
        });
        let receipt = parse_receipt(&reverted).unwrap();
        assert!(!receipt.succeeded);
        assert_eq!(receipt.gas_used, None);
    }

    #[test]
    fn receipt_without_status_is_invalid() {
        let value = serde_json::json!({ "blockNumber": "0x1" });
        assert!(parse_receipt(&value).is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let client = RpcClient::new("http://127.0.0.1:1", Duration::from_millis(200)).unwrap();
        match client.gas_price().await {
            Err(RpcError::Transport(_)) => {}
            other => panic!("expected transport error, got {other:?}"),
        }
    }
}
