use std::time::Duration;

use crate::client::{RpcClient, TxReceipt};
use crate::error::RpcError;

#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Mined; the receipt carries success/revert status.
    Mined(TxReceipt),
    /// Still unmined after the poll ceiling.
    Pending,
}

/// Poll for a transaction receipt until it is mined or `max_polls` attempts
/// have elapsed. Transport errors are logged and count as attempts, so a
/// flapping endpoint cannot keep the loop alive forever.
pub async fn poll_receipt(
    client: &RpcClient,
    hash: &str,
    max_polls: u32,
    interval: Duration,
) -> Result<PollOutcome, RpcError> {
    for attempt in 0..max_polls {
        match client.transaction_receipt(hash).await {
            Ok(Some(receipt)) => return Ok(PollOutcome::Mined(receipt)),
            Ok(None) => {}
            Err(RpcError::Transport(err)) => {
                tracing::warn!(tx = hash, attempt, error = %err, "receipt poll failed");
            }
            Err(err) => return Err(err),
        }

        if attempt + 1 < max_polls {
            tokio::time::sleep(interval).await;
        }
    }

    tracing::warn!(tx = hash, max_polls, "transaction still pending after poll ceiling");
    Ok(PollOutcome::Pending)
}
