//! Local signer abstraction.
use super::MasterKeySigner;
use alloy::{
    primitives::{Address, Bytes},
    signers::{Signer, local::PrivateKeySigner},
};
use std::{fmt, ops::Deref, str::FromStr, sync::Arc};

/// Abstraction over any alloy [`Signer`] used as a master key.
#[derive(Clone)]
pub struct DynSigner(pub Arc<dyn Signer + Send + Sync>);

impl fmt::Debug for DynSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DynSigner").field(&self.0.address()).finish()
    }
}

impl DynSigner {
    /// Load a private key.
    pub fn from_signing_key(key: &str) -> eyre::Result<Self> {
        Ok(Self(Arc::new(PrivateKeySigner::from_str(key)?)))
    }

    /// Generates a random local key.
    pub fn random() -> Self {
        Self(Arc::new(PrivateKeySigner::random()))
    }
}

impl Deref for DynSigner {
    type Target = dyn Signer + Send + Sync;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

#[async_trait::async_trait]
impl MasterKeySigner for DynSigner {
    async fn address(&self) -> eyre::Result<Address> {
        Ok(Signer::address(self.0.as_ref()))
    }

    async fn sign_message(&self, message: &[u8]) -> eyre::Result<Bytes> {
        Ok(Signer::sign_message(self.0.as_ref(), message).await?.as_bytes().into())
    }
}
