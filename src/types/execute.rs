//! Execute calls authorized and run by the account.

use super::{ModuleGuest, ModuleMain, Transaction};
use alloy::{
    primitives::{Address, B256, Bytes, ChainId, U256, keccak256},
    sol_types::SolCall,
};
use serde::{Deserialize, Serialize};

/// An unsigned execute of the account implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainExecute {
    /// Calls run by the execute.
    pub txs: Vec<Transaction>,
    /// Meta-transaction nonce the execute is signed for.
    pub nonce: U256,
    /// Keyset indexes of the keys signing the execute.
    pub signer_indexes: Vec<usize>,
}

impl MainExecute {
    /// Digest signed by the keyset.
    ///
    /// `keccak256(uint256 chainId ‖ address account ‖ uint256 nonce ‖ abi.encode(txs))`
    pub fn digest(&self, chain_id: ChainId, account: Address) -> B256 {
        let txs = Transaction::abi_encode_array(&self.txs);
        let mut buf = Vec::with_capacity(84 + txs.len());
        buf.extend_from_slice(&U256::from(chain_id).to_be_bytes::<32>());
        buf.extend_from_slice(account.as_slice());
        buf.extend_from_slice(&self.nonce.to_be_bytes::<32>());
        buf.extend_from_slice(&txs);
        keccak256(buf)
    }

    /// Attaches a keyset signature.
    pub fn into_signed(self, signature: Bytes) -> SignedMainExecute {
        SignedMainExecute { txs: self.txs, nonce: self.nonce, signature }
    }
}

/// One element of a [`BundledExecute`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SubExecute {
    /// A plain call, used for the account deployment.
    Call(Transaction),
    /// An execute of the account at `target`.
    Execute {
        /// The account running the execute.
        target: Address,
        /// The execute itself.
        execute: MainExecute,
    },
}

/// Ordered sub-executions run by the guest module.
///
/// Used to deploy an account and run its first execute in one relayed transaction. The
/// deployment call always comes first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundledExecute {
    subs: Vec<SubExecute>,
}

impl BundledExecute {
    /// Bundles `deploy` in front of an execute of the account at `target`.
    pub fn deploy_and_execute(deploy: Transaction, target: Address, execute: MainExecute) -> Self {
        Self { subs: vec![SubExecute::Call(deploy), SubExecute::Execute { target, execute }] }
    }

    /// The sub-executions in order.
    pub fn subs(&self) -> &[SubExecute] {
        &self.subs
    }

    /// The deployment call at the head of the bundle.
    pub fn deployment(&self) -> Option<&Transaction> {
        match self.subs.first() {
            Some(SubExecute::Call(tx)) => Some(tx),
            _ => None,
        }
    }

    /// The account execute carried by the bundle.
    pub fn main(&self) -> Option<&MainExecute> {
        self.subs.iter().find_map(|sub| match sub {
            SubExecute::Execute { execute, .. } => Some(execute),
            SubExecute::Call(_) => None,
        })
    }
}

/// An execute call before signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "execute", rename_all = "camelCase")]
pub enum RawExecuteCall {
    /// Execute of a deployed account.
    Main(MainExecute),
    /// Deployment bundled with the first execute.
    Bundled(BundledExecute),
}

impl RawExecuteCall {
    /// The account execute, bundled or not.
    pub fn main(&self) -> Option<&MainExecute> {
        match self {
            Self::Main(main) => Some(main),
            Self::Bundled(bundled) => bundled.main(),
        }
    }
}

/// A [`MainExecute`] with its keyset signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedMainExecute {
    /// Calls run by the execute.
    pub txs: Vec<Transaction>,
    /// Meta-transaction nonce.
    pub nonce: U256,
    /// Keyset signature over [`MainExecute::digest`].
    pub signature: Bytes,
}

impl SignedMainExecute {
    /// `ModuleMain.execute(txs, nonce, signature)` calldata.
    pub fn calldata(&self) -> Bytes {
        ModuleMain::executeCall {
            _txs: self.txs.clone(),
            _nonce: self.nonce,
            _signature: self.signature.clone(),
        }
        .abi_encode()
        .into()
    }

    /// The execute as a call against the account at `target`.
    pub fn to_transaction(&self, target: Address) -> Transaction {
        Transaction::call(target, U256::ZERO, self.calldata())
    }
}

/// An execute call ready to be relayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "execute", rename_all = "camelCase")]
pub enum SignedExecuteCall {
    /// Signed execute of a deployed account.
    Main(SignedMainExecute),
    /// Guest module calls deploying the account and running its signed execute.
    Bundled(Vec<Transaction>),
}

impl SignedExecuteCall {
    /// The address the relayed transaction is sent to.
    pub fn wallet_address(&self, account: Address, module_guest: Address) -> Address {
        match self {
            Self::Main(_) => account,
            Self::Bundled(_) => module_guest,
        }
    }

    /// Calldata of the relayed transaction.
    pub fn calldata(&self) -> Bytes {
        match self {
            Self::Main(main) => main.calldata(),
            Self::Bundled(txs) => ModuleGuest::executeCall {
                _txs: txs.clone(),
                _nonce: U256::ZERO,
                _signature: Bytes::new(),
            }
            .abi_encode()
            .into(),
        }
    }
}
