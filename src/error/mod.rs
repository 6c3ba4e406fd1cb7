//! Smart account error types.
use alloy::primitives::{B256, ChainId};
use thiserror::Error;

mod lifecycle;
pub use lifecycle::LifecycleError;

mod relayer;
pub use relayer::RelayerError;

mod signing;
pub use signing::SigningError;

/// Message carried by signer failures that produced no signature at all.
///
/// Sends failing with this message are reported as [`AccountError::SignatureMissing`] instead of
/// [`AccountError::SendFailed`].
pub const SIGNATURE_MISSING: &str = "signature missing";

/// The overarching error type returned by [`SmartAccount`](crate::account::SmartAccount).
#[derive(Debug, Error)]
pub enum AccountError {
    /// The account is not in a state that permits the operation.
    #[error("unsupported operation: {0}")]
    Lifecycle(#[from] LifecycleError),
    /// No relayer or RPC endpoint is configured for the chain.
    #[error("unsupported chain {0}")]
    UnsupportedChain(ChainId),
    /// The caller supplied invalid parameters.
    #[error("invalid params: {0}")]
    InvalidParams(String),
    /// The master key signer could not be used.
    #[error("invalid master key signer: {0}")]
    InvalidSigner(String),
    /// A chain read failed.
    #[error("invalid provider: {0}")]
    InvalidProvider(String),
    /// The relayer could not simulate the execute call.
    #[error("Simulating Transaction Failed: {0}")]
    SimulationFailed(String),
    /// The execute call could not be signed or relayed.
    #[error("Sending Transaction Failed: {0}")]
    SendFailed(String),
    /// A signer produced no signature while sending.
    ///
    /// Kept apart from [`Self::SendFailed`] since callers match on it.
    #[error("Sending Transaction Failed: signature is null")]
    SignatureMissing,
    /// The relayer did not report a receipt in time.
    #[error("timeout waiting for receipt of {tx_hash} after {attempts} attempts")]
    Timeout {
        /// The relayer transaction hash.
        tx_hash: B256,
        /// Number of polls performed.
        attempts: u64,
    },
    /// The relayer rejected a request.
    #[error(transparent)]
    Transport(#[from] RelayerError),
    /// Signing failed outside of a send.
    #[error(transparent)]
    Signing(#[from] SigningError),
    /// An internal error occurred.
    #[error(transparent)]
    InternalError(#[from] eyre::Error),
}

impl AccountError {
    /// Wraps a failure that happened while signing or relaying a transaction.
    ///
    /// Missing signatures keep their own variant, everything else becomes
    /// [`Self::SendFailed`].
    pub(crate) fn sending(err: impl Into<Self>) -> Self {
        match err.into() {
            Self::SignatureMissing | Self::Signing(SigningError::MissingSignature) => {
                Self::SignatureMissing
            }
            Self::SendFailed(msg) => Self::SendFailed(msg),
            other => {
                let msg = other.to_string();
                if msg.contains(SIGNATURE_MISSING) {
                    Self::SignatureMissing
                } else {
                    Self::SendFailed(msg)
                }
            }
        }
    }

    /// Wraps a failure of the remote simulation.
    pub(crate) fn simulating(err: impl Into<Self>) -> Self {
        match err.into() {
            Self::SimulationFailed(msg) => Self::SimulationFailed(msg),
            other => Self::SimulationFailed(other.to_string()),
        }
    }
}
