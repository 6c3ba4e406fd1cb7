//! Request and response bodies exchanged with the relayer and the config service.

use super::{FeeActionPointSig, FreeFeeOption, Key, Keyset, RawExecuteCall, SignedExecuteCall};
use alloy::primitives::{Address, ChainId};
use serde::{Deserialize, Serialize};
use url::Url;

/// Response envelope wrapping every relayer and config service reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    /// Application status, `200` on success.
    pub status_code: u16,
    /// Error message, if any.
    #[serde(default)]
    pub message: Option<String>,
    /// Response payload.
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

/// Request body of `transaction/simulate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateArgs {
    /// The account address.
    pub target: Address,
    /// Keys of the account, without their signers.
    pub keyset: Vec<Key>,
    /// The unsigned execute call.
    pub execute: RawExecuteCall,
    /// Fee token to price, all accepted tokens when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Address>,
}

impl SimulateArgs {
    /// Creates the simulation request for `execute`.
    pub fn new(
        target: Address,
        keyset: &Keyset,
        execute: RawExecuteCall,
        token: Option<Address>,
    ) -> Self {
        Self { target, keyset: keyset.keys().to_vec(), execute, token }
    }
}

/// Request body of `transaction/send`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingExecuteCallArgs {
    /// The signed execute call json.
    pub call: String,
    /// Address the relayed transaction is sent to.
    pub wallet_address: Address,
    /// Proof that the fee is paid with action points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_action_point_sig: Option<FeeActionPointSig>,
    /// Voucher waiving the fee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_fee_option: Option<FreeFeeOption>,
}

impl PendingExecuteCallArgs {
    /// Packages `call` for the relayer.
    pub fn new(
        call: &SignedExecuteCall,
        wallet_address: Address,
        fee_action_point_sig: Option<FeeActionPointSig>,
        free_fee_option: Option<FreeFeeOption>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            call: serde_json::to_string(call)?,
            wallet_address,
            fee_action_point_sig,
            free_fee_option,
        })
    }
}

/// Chain configuration returned by the config service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfigResponse {
    /// Relayer serving the chain.
    #[serde(rename = "unipassRelayerUrl", alias = "relayerUrl")]
    pub relayer_url: Url,
}

/// Account status reported to the config service after a send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    /// The app id.
    pub app_id: String,
    /// The chain the account sent on.
    pub chain_id: ChainId,
    /// The account address.
    pub address: Address,
}
