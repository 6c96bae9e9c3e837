//! EVM JSON-RPC access for the marketplace: account balances, gas prices and
//! estimates, transaction receipts, and the fee-breakdown arithmetic shown to
//! buyers before they commit to a purchase.

pub mod client;
pub mod error;
pub mod explorer;
pub mod gas;
pub mod quantity;
pub mod receipt;

pub use client::{Balance, EstimateGasCall, RpcClient, TxReceipt};
pub use error::RpcError;
pub use explorer::Explorer;
pub use gas::{fee_breakdown, FeeBreakdown, GasEstimate};
pub use receipt::{poll_receipt, PollOutcome};
