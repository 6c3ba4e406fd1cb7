//! Relayer access.
//!
//! The account only talks to the relayer through the [`Relayer`] trait. [`RelayerClient`] is the
//! HTTP implementation.

mod client;
pub use client::{RelayerClient, decode_envelope, decode_response};

use crate::{
    error::RelayerError,
    types::{
        ReceiptResponse, RelayerSimulateResult, TokensInfo,
        rpc::{PendingExecuteCallArgs, SimulateArgs},
    },
};
use alloy::primitives::B256;

/// Operations offered by a relayer.
#[async_trait::async_trait]
pub trait Relayer: Send + Sync {
    /// Simulates an unsigned execute call and prices its fee.
    async fn simulate(&self, args: &SimulateArgs) -> Result<RelayerSimulateResult, RelayerError>;

    /// Relays a signed execute call, returning the relayer transaction hash.
    async fn relay(&self, args: &PendingExecuteCallArgs) -> Result<B256, RelayerError>;

    /// Returns the receipt of a relayed transaction, if it is available yet.
    async fn wait(&self, tx_hash: B256) -> Result<ReceiptResponse, RelayerError>;

    /// Returns the fee tokens accepted by the relayer.
    async fn fee_tokens(&self) -> Result<TokensInfo, RelayerError>;
}
