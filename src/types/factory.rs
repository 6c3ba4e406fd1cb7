//! Account factories and deterministic address derivation.

use super::Transaction;
use crate::constants::{ACCOUNT_FACTORY_ADDRESS, SINGLETON_FACTORY_ADDRESS, WALLET_CREATION_CODE};
use alloy::{
    primitives::{Address, B256, Bytes, U256, keccak256},
    sol,
    sol_types::SolCall,
};
use serde::{Deserialize, Serialize};

sol! {
    /// [EIP-2470](https://eips.ethereum.org/EIPS/eip-2470) singleton factory.
    interface SingletonFactory {
        function deploy(bytes memory _initCode, bytes32 _salt) public returns (address createdContract);
    }

    /// Factory deploying accounts on behalf of an app.
    interface AccountFactory {
        function deploy(bytes32 _keysetHash, bytes memory _initCode, string memory _appId) external returns (address createdContract);
    }
}

/// Contracts an account is deployed from and executed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletContext {
    /// Implementation the account proxy delegates to.
    pub module_main: Address,
    /// Module running bundled executes of undeployed accounts.
    pub module_guest: Address,
    /// CREATE2 deployer the account address is derived from.
    #[serde(default = "default_singleton_factory")]
    pub singleton_factory: Address,
    /// Factory deploying accounts for an app id.
    #[serde(default = "default_account_factory")]
    pub account_factory: Address,
    /// Creation code of the account proxy.
    #[serde(default = "default_creation_code")]
    pub creation_code: Bytes,
}

fn default_singleton_factory() -> Address {
    SINGLETON_FACTORY_ADDRESS
}

fn default_account_factory() -> Address {
    ACCOUNT_FACTORY_ADDRESS
}

fn default_creation_code() -> Bytes {
    Bytes::from_static(&WALLET_CREATION_CODE)
}

impl WalletContext {
    /// Creates a context with the default factories and creation code.
    pub fn new(module_main: Address, module_guest: Address) -> Self {
        Self {
            module_main,
            module_guest,
            singleton_factory: SINGLETON_FACTORY_ADDRESS,
            account_factory: ACCOUNT_FACTORY_ADDRESS,
            creation_code: default_creation_code(),
        }
    }

    /// The account init code: `creationCode ‖ uint256(moduleMain)`.
    pub fn init_code(&self) -> Bytes {
        let mut code = Vec::with_capacity(self.creation_code.len() + 32);
        code.extend_from_slice(&self.creation_code);
        code.extend_from_slice(B256::left_padding_from(self.module_main.as_slice()).as_slice());
        code.into()
    }

    /// Computes the counterfactual account address for a keyset hash.
    ///
    /// `create2(singletonFactory, keysetHash, keccak256(initCode))`
    pub fn account_address(&self, keyset_hash: B256) -> Address {
        self.singleton_factory.create2(keyset_hash, keccak256(self.init_code()))
    }

    /// Calldata deploying the account through the singleton factory.
    ///
    /// This is the deployment embedded into pre-deployment signatures.
    pub fn factory_calldata(&self, keyset_hash: B256) -> Bytes {
        SingletonFactory::deployCall { _initCode: self.init_code(), _salt: keyset_hash }
            .abi_encode()
            .into()
    }

    /// The call deploying the account through the app factory.
    pub fn deploy_transaction(&self, app_id: &str, keyset_hash: B256) -> Transaction {
        let data = AccountFactory::deployCall {
            _keysetHash: keyset_hash,
            _initCode: self.init_code(),
            _appId: app_id.to_string(),
        }
        .abi_encode();
        Transaction::call(self.account_factory, U256::ZERO, data.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256};

    fn context() -> WalletContext {
        WalletContext::new(
            address!("0x00000000000000000000000000000000000000a1"),
            address!("0x00000000000000000000000000000000000000b2"),
        )
    }

    #[test]
    fn init_code_appends_module_main() {
        let code = context().init_code();
        assert_eq!(code.len(), WALLET_CREATION_CODE.len() + 32);
        assert_eq!(&code[..WALLET_CREATION_CODE.len()], &WALLET_CREATION_CODE);
        assert_eq!(code[code.len() - 1], 0xa1);
        assert!(code[WALLET_CREATION_CODE.len()..code.len() - 1].iter().all(|b| *b == 0));
    }

    #[test]
    fn account_address_is_deterministic() {
        let hash = b256!("0x1111111111111111111111111111111111111111111111111111111111111111");
        let ctx = context();
        assert_eq!(ctx.account_address(hash), ctx.account_address(hash));
        assert_eq!(
            ctx.account_address(hash),
            SINGLETON_FACTORY_ADDRESS.create2(hash, keccak256(ctx.init_code()))
        );
    }

    #[test]
    fn account_address_depends_on_every_input() {
        let hash = b256!("0x1111111111111111111111111111111111111111111111111111111111111111");
        let ctx = context();
        let base = ctx.account_address(hash);

        let other_hash =
            b256!("0x2222222222222222222222222222222222222222222222222222222222222222");
        assert_ne!(base, ctx.account_address(other_hash));

        let mut other_module = ctx.clone();
        other_module.module_main = address!("0x00000000000000000000000000000000000000a2");
        assert_ne!(base, other_module.account_address(hash));

        let mut other_code = ctx.clone();
        other_code.creation_code = Bytes::from_static(&[0x60, 0x00]);
        assert_ne!(base, other_code.account_address(hash));
    }

    #[test]
    fn deploy_transaction_targets_factory() {
        let hash = b256!("0x1111111111111111111111111111111111111111111111111111111111111111");
        let ctx = context();
        let tx = ctx.deploy_transaction("app", hash);
        assert_eq!(tx.target, ACCOUNT_FACTORY_ADDRESS);
        assert!(tx.revertOnError);
        assert_eq!(tx.value, U256::ZERO);

        let call = AccountFactory::deployCall::abi_decode(&tx.data).unwrap();
        assert_eq!(call._keysetHash, hash);
        assert_eq!(call._initCode, ctx.init_code());
        assert_eq!(call._appId, "app");
    }

    #[test]
    fn context_yaml_defaults() {
        let s = r#"
module_main: "0x00000000000000000000000000000000000000a1"
module_guest: "0x00000000000000000000000000000000000000b2"
"#;
        let ctx = serde_yaml::from_str::<WalletContext>(s).unwrap();
        assert_eq!(ctx, context());
    }
}
