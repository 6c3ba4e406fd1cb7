//! Waiting for relayer receipts.

use crate::{
    constants::RECEIPT_POLL_INTERVAL, error::AccountError, relayer::Relayer, types::ReceiptResult,
};
use alloy::primitives::B256;
use std::{sync::Arc, time::Duration};
use tracing::{debug, instrument, trace};

/// Polls a relayer until a transaction is confirmed.
#[derive(Clone)]
pub struct ConfirmationPoller {
    relayer: Arc<dyn Relayer>,
    interval: Duration,
}

impl ConfirmationPoller {
    /// Creates a poller asking `relayer` once per second.
    pub fn new(relayer: Arc<dyn Relayer>) -> Self {
        Self { relayer, interval: RECEIPT_POLL_INTERVAL }
    }

    /// Waits for the receipt of `tx_hash`.
    ///
    /// The relayer is polled at most `timeout` times, one poll per interval, and the first
    /// receipt reported is returned with `confirmations` attached. Relayer errors abort the
    /// wait.
    #[instrument(skip(self))]
    pub async fn wait_for_receipt(
        &self,
        tx_hash: B256,
        confirmations: u64,
        timeout: u64,
    ) -> Result<ReceiptResult, AccountError> {
        for attempt in 0..timeout {
            if let Some(mut receipt) = self.relayer.wait(tx_hash).await?.receipt {
                debug!(attempt, "receipt available");
                receipt.confirmations = confirmations;
                return Ok(receipt);
            }
            trace!(attempt, "receipt not available yet");
            tokio::time::sleep(self.interval).await;
        }
        Err(AccountError::Timeout { tx_hash, attempts: timeout })
    }
}

impl std::fmt::Debug for ConfirmationPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationPoller").field("interval", &self.interval).finish()
    }
}
