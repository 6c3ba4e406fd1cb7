//! Deployment status and nonce of an account.

use crate::{error::AccountError, provider::ChainReader, types::ModuleMain};
use alloy::{
    primitives::{Address, U256},
    sol_types::{SolCall, SolValue},
};
use tracing::{debug, instrument};

/// Freshly read on-chain state of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountState {
    /// Whether code is deployed at the account address.
    pub is_deployed: bool,
    /// The account's current nonce, zero while undeployed.
    pub nonce: U256,
}

/// Returns whether code is deployed at `address`.
pub async fn is_deployed(reader: &dyn ChainReader, address: Address) -> Result<bool, AccountError> {
    let code = reader
        .code_at(address)
        .await
        .map_err(|err| AccountError::InvalidProvider(format!("Provider Got Code Failed: {err}")))?;
    Ok(!code.is_empty())
}

/// Reads the nonce and the deployment status of `address` concurrently.
///
/// A failed nonce read is ignored for undeployed accounts, whose nonce is zero.
#[instrument(skip(reader))]
pub async fn resolve_nonce_and_deployment(
    reader: &dyn ChainReader,
    address: Address,
) -> Result<AccountState, AccountError> {
    let nonce = async {
        let data = ModuleMain::getNonceCall {}.abi_encode();
        let ret = reader.call(address, data.into()).await.map_err(|err| err.to_string())?;
        U256::abi_decode(&ret).map_err(|err| err.to_string())
    };
    let (nonce, is_deployed) =
        futures_util::future::join(nonce, is_deployed(reader, address)).await;

    let is_deployed = is_deployed?;
    let nonce = if is_deployed {
        nonce.map_err(|err| AccountError::InvalidProvider(format!("Got Nonce Failed: {err}")))?
    } else {
        U256::ZERO
    };
    debug!(is_deployed, %nonce, "resolved account state");

    Ok(AccountState { is_deployed, nonce })
}
