//! Account lifecycle state machine.

use crate::{chains::ChainContext, error::LifecycleError, types::Keyset};
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Externally visible lifecycle state of a [`SmartAccount`](super::SmartAccount).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountStatus {
    /// Created but not initialized.
    Uninitialized,
    /// Ready for use.
    Initialized,
    /// Terminal. The instance must be discarded.
    Destroyed,
}

/// Identity and chain binding of an initialized account.
#[derive(Debug, Clone)]
pub(crate) struct ActiveAccount {
    /// The account address. Never changes for the lifetime of the account.
    pub(crate) address: Address,
    /// Keyset controlling the account.
    pub(crate) keyset: Keyset,
    /// Address of the master key signer.
    pub(crate) signer_address: Address,
    /// The active chain.
    pub(crate) chain: ChainContext,
}

/// Lifecycle of an account, carrying the identity while it is initialized.
#[derive(Debug, Default)]
pub(crate) enum Lifecycle {
    #[default]
    Uninitialized,
    Initialized(Box<ActiveAccount>),
    Destroyed,
}

impl Lifecycle {
    pub(crate) fn status(&self) -> AccountStatus {
        match self {
            Self::Uninitialized => AccountStatus::Uninitialized,
            Self::Initialized(_) => AccountStatus::Initialized,
            Self::Destroyed => AccountStatus::Destroyed,
        }
    }

    /// Gate of every operation requiring an initialized account.
    pub(crate) fn active(&self) -> Result<&ActiveAccount, LifecycleError> {
        match self {
            Self::Initialized(account) => Ok(account.as_ref()),
            Self::Uninitialized => Err(LifecycleError::Uninitialized),
            Self::Destroyed => Err(LifecycleError::Destroyed),
        }
    }

    pub(crate) fn active_mut(&mut self) -> Result<&mut ActiveAccount, LifecycleError> {
        match self {
            Self::Initialized(account) => Ok(account.as_mut()),
            Self::Uninitialized => Err(LifecycleError::Uninitialized),
            Self::Destroyed => Err(LifecycleError::Destroyed),
        }
    }

    /// Gate of initialization and destruction.
    pub(crate) fn ensure_not_destroyed(&self) -> Result<(), LifecycleError> {
        match self {
            Self::Uninitialized | Self::Initialized(_) => Ok(()),
            Self::Destroyed => Err(LifecycleError::Destroyed),
        }
    }
}
