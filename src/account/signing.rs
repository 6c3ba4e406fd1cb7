//! Signatures over execute calls and messages.

use crate::{
    constants::{EIP712_KEY_INDEX, ERC6492_DETECTION_SUFFIX, MASTER_KEY_INDEX},
    error::{AccountError, SigningError},
    types::{Keyset, MainExecute, RawExecuteCall, SignedExecuteCall, SubExecute, WalletContext},
};
use alloy::{
    dyn_abi::TypedData,
    primitives::{Address, B256, Bytes, ChainId, U256, eip191_hash_message, keccak256},
    sol,
    sol_types::SolValue,
};
use tracing::trace;

sol! {
    /// `(address factory, bytes factoryCalldata, bytes innerSig)` prefix of an
    /// [EIP-6492](https://eips.ethereum.org/EIPS/eip-6492) signature.
    struct Sig6492 {
        address factory;
        bytes factoryCalldata;
        bytes innerSig;
    }
}

/// Produces keyset signatures on behalf of one account.
#[derive(Debug, Clone, Copy)]
pub struct SigningCoordinator<'a> {
    keyset: &'a Keyset,
    context: &'a WalletContext,
    account: Address,
    chain_id: ChainId,
}

impl<'a> SigningCoordinator<'a> {
    /// Creates a coordinator signing for `account` on `chain_id`.
    pub fn new(
        keyset: &'a Keyset,
        context: &'a WalletContext,
        account: Address,
        chain_id: ChainId,
    ) -> Self {
        Self { keyset, context, account, chain_id }
    }

    /// Digest of `message` bound to the account and chain.
    ///
    /// `keccak256("\x19\x01" ‖ uint256 chainId ‖ address account ‖ eip191(message))`
    pub fn message_digest(&self, message: &[u8]) -> B256 {
        let mut buf = Vec::with_capacity(2 + 32 + 20 + 32);
        buf.extend_from_slice(b"\x19\x01");
        buf.extend_from_slice(&U256::from(self.chain_id).to_be_bytes::<32>());
        buf.extend_from_slice(self.account.as_slice());
        buf.extend_from_slice(eip191_hash_message(message).as_slice());
        keccak256(buf)
    }

    /// Signs `message` with the master key.
    pub async fn sign_digest(
        &self,
        message: &[u8],
        is_deployed: bool,
    ) -> Result<Bytes, SigningError> {
        self.sign(self.message_digest(message), &[MASTER_KEY_INDEX], is_deployed).await
    }

    /// Signs `message` with the EIP-712 key.
    pub async fn sign_digest_712(
        &self,
        message: &[u8],
        is_deployed: bool,
    ) -> Result<Bytes, SigningError> {
        self.sign(self.message_digest(message), &[EIP712_KEY_INDEX], is_deployed).await
    }

    /// Signs `digest` with the keys at `indexes`.
    ///
    /// Signatures of undeployed accounts are wrapped per EIP-6492, see [`Self::wrap_erc6492`].
    pub async fn sign(
        &self,
        digest: B256,
        indexes: &[usize],
        is_deployed: bool,
    ) -> Result<Bytes, SigningError> {
        let signature = self.keyset.sign(digest, indexes).await?;
        trace!(%digest, ?indexes, is_deployed, "signed digest");
        if is_deployed { Ok(signature) } else { Ok(self.wrap_erc6492(signature)) }
    }

    /// `abi.encode(singletonFactory, factoryCalldata, signature) ‖ 0x6492…6492`
    pub fn wrap_erc6492(&self, signature: Bytes) -> Bytes {
        let mut wrapped = Sig6492 {
            factory: self.context.singleton_factory,
            factoryCalldata: self.context.factory_calldata(self.keyset.hash()),
            innerSig: signature,
        }
        .abi_encode_params();
        wrapped.extend_from_slice(&ERC6492_DETECTION_SUFFIX);
        wrapped.into()
    }

    /// Signs every account execute of `execute`.
    ///
    /// Bundled executes turn into guest module calls: the deployment call as is, followed by a
    /// `ModuleMain.execute` call against the account.
    pub async fn sign_execute(
        &self,
        execute: RawExecuteCall,
    ) -> Result<SignedExecuteCall, SigningError> {
        match execute {
            RawExecuteCall::Main(main) => {
                let signature = self.sign_main(&main, self.account).await?;
                Ok(SignedExecuteCall::Main(main.into_signed(signature)))
            }
            RawExecuteCall::Bundled(bundled) => {
                let mut txs = Vec::with_capacity(bundled.subs().len());
                for sub in bundled.subs() {
                    match sub {
                        SubExecute::Call(tx) => txs.push(tx.clone()),
                        SubExecute::Execute { target, execute } => {
                            let signature = self.sign_main(execute, *target).await?;
                            let signed = execute.clone().into_signed(signature);
                            txs.push(signed.to_transaction(*target));
                        }
                    }
                }
                Ok(SignedExecuteCall::Bundled(txs))
            }
        }
    }

    async fn sign_main(
        &self,
        main: &MainExecute,
        target: Address,
    ) -> Result<Bytes, SigningError> {
        self.keyset.sign(main.digest(self.chain_id, target), &main.signer_indexes).await
    }
}

/// The payload signed for typed data: `{hash, types, value, domain}` as JSON.
pub fn typed_data_payload(typed_data: &TypedData) -> Result<String, AccountError> {
    let hash = typed_data
        .eip712_signing_hash()
        .map_err(|err| AccountError::InvalidParams(format!("invalid typed data: {err}")))?;
    let value =
        serde_json::to_value(typed_data).map_err(|err| AccountError::InternalError(err.into()))?;
    let payload = serde_json::json!({
        "hash": hash,
        "types": value["types"],
        "value": value["message"],
        "domain": value["domain"],
    });
    Ok(payload.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        signers::{DynSigner, SignType},
        types::{BundledExecute, ModuleMain, Transaction},
    };
    use alloy::{primitives::address, sol_types::SolCall};
    use std::sync::Arc;

    const ACCOUNT: Address = address!("0x00000000000000000000000000000000000000cc");

    fn context() -> WalletContext {
        WalletContext::new(
            address!("0x00000000000000000000000000000000000000a1"),
            address!("0x00000000000000000000000000000000000000b2"),
        )
    }

    fn keyset() -> Keyset {
        let signer = DynSigner::from_signing_key(
            "0x0000000000000000000000000000000000000000000000000000000000000001",
        )
        .unwrap();
        Keyset::from_master(signer.address(), Arc::new(signer))
    }

    #[test]
    fn message_digest_binds_chain_and_account() {
        let (keyset, context) = (keyset(), context());
        let digest = SigningCoordinator::new(&keyset, &context, ACCOUNT, 1).message_digest(b"hi");
        assert_ne!(
            digest,
            SigningCoordinator::new(&keyset, &context, ACCOUNT, 2).message_digest(b"hi")
        );
        assert_ne!(
            digest,
            SigningCoordinator::new(&keyset, &context, Address::ZERO, 1).message_digest(b"hi")
        );
    }

    #[tokio::test]
    async fn deployed_signature_is_raw() {
        let (keyset, context) = (keyset(), context());
        let coordinator = SigningCoordinator::new(&keyset, &context, ACCOUNT, 1);

        let signature = coordinator.sign_digest(b"hello", true).await.unwrap();
        let raw = keyset.sign(coordinator.message_digest(b"hello"), &[0]).await.unwrap();
        assert_eq!(signature, raw);
        assert!(!signature.ends_with(&ERC6492_DETECTION_SUFFIX));
    }

    #[tokio::test]
    async fn undeployed_signature_is_wrapped() {
        let (keyset, context) = (keyset(), context());
        let coordinator = SigningCoordinator::new(&keyset, &context, ACCOUNT, 1);

        let signature = coordinator.sign_digest(b"hello", false).await.unwrap();
        assert!(signature.ends_with(&ERC6492_DETECTION_SUFFIX));

        let body = &signature[..signature.len() - 32];
        let decoded = Sig6492::abi_decode_params(body).unwrap();
        assert_eq!(decoded.factory, context.singleton_factory);
        assert_eq!(decoded.factoryCalldata, context.factory_calldata(keyset.hash()));
        let raw = keyset.sign(coordinator.message_digest(b"hello"), &[0]).await.unwrap();
        assert_eq!(decoded.innerSig, raw);
    }

    #[tokio::test]
    async fn digest_712_uses_second_key() {
        let (keyset, context) = (keyset(), context());
        let coordinator = SigningCoordinator::new(&keyset, &context, ACCOUNT, 1);

        let signature = coordinator.sign_digest_712(b"hello", true).await.unwrap();
        // index 0 is referenced by its 33 byte serialization, index 1 signs
        assert_eq!(signature[1], 0);
        assert_eq!(signature[35], 1);
        assert_eq!(*signature.last().unwrap(), SignType::Eip712Sign as u8);
    }

    #[tokio::test]
    async fn signs_bundled_execute_against_account() {
        let (keyset, context) = (keyset(), context());
        let coordinator = SigningCoordinator::new(&keyset, &context, ACCOUNT, 1);

        let main = MainExecute {
            txs: vec![Transaction::call(Address::ZERO, U256::from(1), Bytes::new())],
            nonce: U256::from(1),
            signer_indexes: vec![0],
        };
        let deploy = context.deploy_transaction("app", keyset.hash());
        let signed = coordinator
            .sign_execute(RawExecuteCall::Bundled(BundledExecute::deploy_and_execute(
                deploy.clone(),
                ACCOUNT,
                main.clone(),
            )))
            .await
            .unwrap();

        let SignedExecuteCall::Bundled(txs) = signed else { panic!("expected bundled call") };
        assert_eq!(txs[0], deploy);
        assert_eq!(txs[1].target, ACCOUNT);
        let execute = ModuleMain::executeCall::abi_decode(&txs[1].data).unwrap();
        assert_eq!(execute._txs, main.txs);
        assert_eq!(execute._nonce, U256::from(1));
        assert_eq!(
            execute._signature,
            keyset.sign(main.digest(1, ACCOUNT), &[0]).await.unwrap()
        );
        // execute signatures are never wrapped
        assert!(!execute._signature.ends_with(&ERC6492_DETECTION_SUFFIX));
    }

    #[test]
    fn typed_data_payload_carries_hash() {
        let typed_data: TypedData = serde_json::from_str(
            r#"{
                "types": {
                    "EIP712Domain": [{ "name": "name", "type": "string" }],
                    "Mail": [{ "name": "contents", "type": "string" }]
                },
                "primaryType": "Mail",
                "domain": { "name": "Ether Mail" },
                "message": { "contents": "Hello, Bob!" }
            }"#,
        )
        .unwrap();
        let payload: serde_json::Value =
            serde_json::from_str(&typed_data_payload(&typed_data).unwrap()).unwrap();
        assert_eq!(
            payload["hash"].as_str().unwrap().parse::<B256>().unwrap(),
            typed_data.eip712_signing_hash().unwrap()
        );
        assert_eq!(payload["value"]["contents"], "Hello, Bob!");
        assert_eq!(payload["domain"]["name"], "Ether Mail");
        assert!(payload["types"]["Mail"].is_array());
    }
}
