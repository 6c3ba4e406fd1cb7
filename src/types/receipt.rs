//! Receipts reported by the relayer.

use alloy::primitives::{B256, ChainId, U256};
use serde::{Deserialize, Serialize};

/// Execution status of a relayed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReceiptStatus {
    /// The transaction was included and succeeded.
    Success,
    /// The transaction was included and reverted.
    Failed,
}

/// Confirmation state of a relayed transaction.
///
/// Only the presence of a receipt is meaningful to the poller, the remaining fields are passed
/// through as reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResult {
    /// The relayer transaction hash.
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    /// The chain the transaction was included on.
    #[serde(default)]
    pub chain_id: Option<ChainId>,
    /// Hash of the including block.
    #[serde(default)]
    pub block_hash: Option<B256>,
    /// Number of the including block.
    #[serde(default)]
    pub block_number: Option<u64>,
    /// Gas used by the transaction.
    #[serde(default)]
    pub gas_used: Option<U256>,
    /// Reported status.
    #[serde(default)]
    pub status: Option<ReceiptStatus>,
    /// Confirmations requested by the caller.
    #[serde(default)]
    pub confirmations: u64,
}

/// Nullable receipt wrapper returned by the relayer wait endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    /// The receipt, `None` until the transaction is confirmed.
    #[serde(default)]
    pub receipt: Option<ReceiptResult>,
}
