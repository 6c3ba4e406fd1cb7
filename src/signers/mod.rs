//! Master key signers.

mod r#dyn;
pub use r#dyn::DynSigner;

use alloy::primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

/// How a key's signature over a digest is produced and verified on-chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum SignType {
    /// The digest is signed as an EIP-712 payload.
    #[serde(rename = "eip712Sign")]
    Eip712Sign = 1,
    /// The digest is signed as an EIP-191 personal message.
    #[default]
    EthSign = 2,
}

/// The external signer backing the master key of an account.
#[async_trait::async_trait]
pub trait MasterKeySigner: std::fmt::Debug + Send + Sync {
    /// Returns the signer's Ethereum address.
    async fn address(&self) -> eyre::Result<Address>;

    /// Signs `message` as an EIP-191 personal message.
    ///
    /// An empty result is treated as a missing signature.
    async fn sign_message(&self, message: &[u8]) -> eyre::Result<Bytes>;

    /// Returns the signer's [`Clearable`] capability, if it has one.
    fn as_clearable(&self) -> Option<&dyn Clearable> {
        None
    }
}

/// Signers holding session material that must be wiped when the account is destroyed.
#[async_trait::async_trait]
pub trait Clearable: Send + Sync {
    /// Clears any cached credentials.
    async fn clear(&self) -> eyre::Result<()>;
}
