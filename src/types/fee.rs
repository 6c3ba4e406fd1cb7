//! Fee negotiation types.

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// A token and amount the account can pay the relayer with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeOption {
    /// The fee token, [`Address::ZERO`] for the native token.
    pub token: Address,
    /// The fee receiver.
    pub to: Address,
    /// Amount in the token's smallest unit.
    pub amount: U256,
    /// Decimals of the token.
    pub decimals: u8,
    /// Name of the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Symbol of the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Why the token cannot be used, if it can't.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FeeOption {
    /// Whether the option pays in the native token.
    pub fn is_native(&self) -> bool {
        self.token.is_zero()
    }
}

/// Outcome of a fee simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResult {
    /// Whether the relayer requires a fee.
    pub is_fee_required: bool,
    /// Fee options, empty when no fee is required.
    pub fee_options: Vec<FeeOption>,
}

/// Pricing of a candidate fee token, as reported by the relayer simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedFeeToken {
    /// The token.
    pub token: Address,
    /// Name of the token.
    #[serde(default)]
    pub name: Option<String>,
    /// Symbol of the token.
    #[serde(default)]
    pub symbol: Option<String>,
    /// Decimals of the token. Defaults to 18.
    #[serde(default)]
    pub decimals: Option<u8>,
    /// Gas used by the simulated execute.
    pub gas_used: U256,
    /// USD price of the token.
    pub token_price: f64,
    /// USD price of the native token.
    pub native_token_price: f64,
    /// Why the token cannot be used, if it can't.
    #[serde(default)]
    pub error: Option<String>,
}

/// The relayer's simulation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayerSimulateResult {
    /// Whether the relayer requires a fee.
    pub is_fee_required: bool,
    /// Pricing of the candidate fee tokens.
    #[serde(default)]
    pub fee_tokens: Vec<SimulatedFeeToken>,
    /// Discount in percent applied to the fee.
    #[serde(default)]
    pub discount: u64,
    /// The fee receiver.
    #[serde(default)]
    pub fee_receiver: Address,
    /// Gas price the relayer will pay.
    #[serde(default)]
    pub gas_price: U256,
}

/// A token accepted by the relayer as fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeToken {
    /// The token, [`Address::ZERO`] for the native token.
    pub token: Address,
    /// Name of the token.
    #[serde(default)]
    pub name: Option<String>,
    /// Symbol of the token.
    #[serde(default)]
    pub symbol: Option<String>,
    /// Decimals of the token.
    #[serde(default)]
    pub decimals: Option<u8>,
}

/// Fee tokens accepted by the relayer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokensInfo {
    /// The accepted tokens.
    pub tokens: Vec<FeeToken>,
}

/// A relayer-signed voucher waiving the fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeFeeOption {
    /// Relayer signature over the voucher.
    pub signature: Bytes,
    /// Expiry timestamp of the voucher.
    pub expires: u64,
}

/// Signature authorizing the fee to be paid with action points.
pub type FeeActionPointSig = Bytes;
