//! Call type executed by the account modules.

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::SolValue,
};
use serde::{Deserialize, Serialize};

sol! {
    /// A single call executed by the account.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Transaction {
        /// How the call is dispatched. See [`CallType`].
        uint8 callType;
        /// Whether a failing call reverts the whole execute.
        bool revertOnError;
        /// The call target.
        address target;
        /// Gas forwarded to the call, `0` forwards all remaining gas.
        uint256 gasLimit;
        /// Amount of native value to send to the target.
        uint256 value;
        /// The calldata bytes.
        bytes data;
    }

    /// Entry points of the account implementation.
    interface ModuleMain {
        /// Executes `_txs` after validating `_signature` against the keyset.
        function execute(Transaction[] calldata _txs, uint256 _nonce, bytes calldata _signature) external payable;

        /// Executes `_txs` from the account itself, authorized by the caller's role weights.
        function selfExecute(uint32 _ownerWeight, uint32 _assetsOpWeight, uint32 _guardianWeight, Transaction[] calldata _txs) external payable;

        /// Returns the current meta-transaction nonce.
        function getNonce() external view returns (uint256);
    }

    /// Guest module used to run bundled executes that do not belong to a deployed account.
    interface ModuleGuest {
        /// Executes `_txs` without signature validation.
        function execute(Transaction[] calldata _txs, uint256 _nonce, bytes calldata _signature) external payable;
    }
}

/// Dispatch kind of a [`Transaction`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CallType {
    /// Regular `CALL`.
    #[default]
    Call = 0,
    /// `DELEGATECALL`.
    DelegateCall = 1,
    /// Call into the account layer.
    CallAccountLayer = 2,
    /// Call into the account hooks.
    CallHooks = 3,
}

impl From<CallType> for u8 {
    fn from(value: CallType) -> Self {
        value as u8
    }
}

impl Transaction {
    /// Creates a plain call with `revertOnError` set and no gas limit.
    pub fn call(target: Address, value: U256, data: Bytes) -> Self {
        Self {
            callType: CallType::Call.into(),
            revertOnError: true,
            target,
            gasLimit: U256::ZERO,
            value,
            data,
        }
    }

    /// Sets the dispatch kind.
    pub fn with_call_type(mut self, call_type: CallType) -> Self {
        self.callType = call_type.into();
        self
    }

    /// Sets the gas limit.
    pub fn with_gas_limit(mut self, gas_limit: U256) -> Self {
        self.gasLimit = gas_limit;
        self
    }

    /// Forces `revertOnError`, which the account always sets on calls it issues.
    pub fn reverting(mut self) -> Self {
        self.revertOnError = true;
        self
    }

    /// ABI encodes a list of transactions as `Transaction[]`.
    pub fn abi_encode_array(txs: &[Self]) -> Vec<u8> {
        txs.to_vec().abi_encode()
    }
}
