//! Turns logical calls into the execute call to sign.

use crate::{
    constants::MASTER_KEY_INDEX,
    error::AccountError,
    types::{
        BundledExecute, Keyset, MainExecute, ModuleMain, RawExecuteCall, Transaction,
        WalletContext,
    },
};
use alloy::{
    primitives::{Address, U256},
    sol_types::SolCall,
};

/// Builds execute calls for one account.
#[derive(Debug, Clone, Copy)]
pub struct TransactionAssembler<'a> {
    app_id: &'a str,
    context: &'a WalletContext,
    account: Address,
    keyset: &'a Keyset,
}

impl<'a> TransactionAssembler<'a> {
    /// Creates an assembler for the account at `account` controlled by `keyset`.
    pub fn new(
        app_id: &'a str,
        context: &'a WalletContext,
        account: Address,
        keyset: &'a Keyset,
    ) -> Self {
        Self { app_id, context, account, keyset }
    }

    /// Assembles `calls` into an execute call.
    ///
    /// A single call is executed as is, several calls are folded into one `selfExecute` of the
    /// account. The fee call is appended last. The execute is signed for `nonce + 1` and, while
    /// the account is undeployed, bundled behind its deployment.
    pub fn assemble(
        &self,
        calls: Vec<Transaction>,
        nonce: U256,
        is_deployed: bool,
        fee_call: Option<Transaction>,
    ) -> Result<RawExecuteCall, AccountError> {
        let calls: Vec<_> = calls.into_iter().map(Transaction::reverting).collect();
        let mut txs = match calls.len() {
            0 => return Err(AccountError::InvalidParams("no transaction to execute".to_string())),
            1 => calls,
            _ => vec![self.self_execute(calls)?],
        };
        txs.extend(fee_call);

        let main = MainExecute {
            txs,
            nonce: nonce + U256::from(1),
            signer_indexes: vec![MASTER_KEY_INDEX],
        };

        if is_deployed {
            return Ok(RawExecuteCall::Main(main));
        }

        let deploy = self.context.deploy_transaction(self.app_id, self.keyset.hash());
        Ok(RawExecuteCall::Bundled(BundledExecute::deploy_and_execute(deploy, self.account, main)))
    }

    /// Batches `calls` into a call of `selfExecute` on the account, weighted by the master key.
    fn self_execute(&self, calls: Vec<Transaction>) -> Result<Transaction, AccountError> {
        let weight = self
            .keyset
            .master()
            .ok_or_else(|| AccountError::InvalidSigner("keyset has no master key".to_string()))?
            .role_weight();
        let data = ModuleMain::selfExecuteCall {
            _ownerWeight: weight.owner_weight,
            _assetsOpWeight: weight.assets_op_weight,
            _guardianWeight: weight.guardian_weight,
            _txs: calls,
        }
        .abi_encode();
        Ok(Transaction::call(self.account, U256::ZERO, data.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::ACCOUNT_FACTORY_ADDRESS,
        signers::DynSigner,
        types::{AccountFactory, RoleWeight, SubExecute},
    };
    use alloy::primitives::{Bytes, address};
    use std::sync::Arc;

    const ACCOUNT: Address = address!("0x00000000000000000000000000000000000000cc");

    fn context() -> WalletContext {
        WalletContext::new(
            address!("0x00000000000000000000000000000000000000a1"),
            address!("0x00000000000000000000000000000000000000b2"),
        )
    }

    fn keyset() -> Keyset {
        let signer = DynSigner::random();
        Keyset::from_master(signer.address(), Arc::new(signer))
    }

    fn call(n: u8) -> Transaction {
        let mut tx = Transaction::call(
            Address::with_last_byte(n),
            U256::from(n),
            Bytes::from(vec![n]),
        );
        tx.revertOnError = false;
        tx
    }

    fn fee_call() -> Transaction {
        Transaction::call(
            address!("0x00000000000000000000000000000000000000fe"),
            U256::from(9),
            Bytes::new(),
        )
    }

    #[test]
    fn single_call_used_directly() {
        let (context, keyset) = (context(), keyset());
        let assembler = TransactionAssembler::new("app", &context, ACCOUNT, &keyset);

        let execute = assembler.assemble(vec![call(1)], U256::from(3), true, None).unwrap();
        let RawExecuteCall::Main(main) = execute else { panic!("expected main execute") };
        assert_eq!(main.txs.len(), 1);
        assert_eq!(main.txs[0].target, Address::with_last_byte(1));
        assert!(main.txs[0].revertOnError);
        assert_eq!(main.nonce, U256::from(4));
        assert_eq!(main.signer_indexes, vec![MASTER_KEY_INDEX]);
    }

    #[test]
    fn many_calls_collapse_into_self_execute() {
        let (context, keyset) = (context(), keyset());
        let assembler = TransactionAssembler::new("app", &context, ACCOUNT, &keyset);

        let execute = assembler
            .assemble(vec![call(1), call(2), call(3)], U256::ZERO, true, Some(fee_call()))
            .unwrap();
        let main = execute.main().unwrap();
        assert_eq!(main.txs.len(), 2);
        assert_eq!(main.txs[0].target, ACCOUNT);
        assert_eq!(main.txs[1], fee_call());

        let batch = ModuleMain::selfExecuteCall::abi_decode(&main.txs[0].data).unwrap();
        assert_eq!(batch._ownerWeight, 100);
        assert_eq!(batch._assetsOpWeight, 100);
        assert_eq!(batch._guardianWeight, 0);
        assert_eq!(batch._txs.len(), 3);
        assert!(batch._txs.iter().all(|tx| tx.revertOnError));
    }

    #[test]
    fn self_execute_uses_master_weight() {
        let signer = DynSigner::random();
        let keyset = Keyset::new(vec![crate::types::Key::secp256k1(
            signer.address(),
            RoleWeight::new(60, 40, 10),
            Default::default(),
            Arc::new(signer),
        )]);
        let context = context();
        let assembler = TransactionAssembler::new("app", &context, ACCOUNT, &keyset);
        let execute = assembler.assemble(vec![call(1), call(2)], U256::ZERO, true, None).unwrap();
        let batch =
            ModuleMain::selfExecuteCall::abi_decode(&execute.main().unwrap().txs[0].data).unwrap();
        assert_eq!(
            (batch._ownerWeight, batch._assetsOpWeight, batch._guardianWeight),
            (60, 40, 10)
        );
    }

    #[test]
    fn nonce_is_always_offset_by_one() {
        let (context, keyset) = (context(), keyset());
        let assembler = TransactionAssembler::new("app", &context, ACCOUNT, &keyset);
        for (nonce, deployed) in [(0u64, false), (0, true), (41, true)] {
            let execute =
                assembler.assemble(vec![call(1)], U256::from(nonce), deployed, None).unwrap();
            assert_eq!(execute.main().unwrap().nonce, U256::from(nonce + 1));
        }
    }

    #[test]
    fn undeployed_account_bundles_deployment_first() {
        let (context, keyset) = (context(), keyset());
        let assembler = TransactionAssembler::new("my-app", &context, ACCOUNT, &keyset);

        let execute =
            assembler.assemble(vec![call(1)], U256::ZERO, false, Some(fee_call())).unwrap();
        let RawExecuteCall::Bundled(bundled) = execute else { panic!("expected bundled execute") };
        assert_eq!(bundled.subs().len(), 2);

        let deploy = bundled.deployment().unwrap();
        assert_eq!(deploy.target, ACCOUNT_FACTORY_ADDRESS);
        let deploy = AccountFactory::deployCall::abi_decode(&deploy.data).unwrap();
        assert_eq!(deploy._keysetHash, keyset.hash());
        assert_eq!(deploy._appId, "my-app");

        let SubExecute::Execute { target, execute } = &bundled.subs()[1] else {
            panic!("expected account execute")
        };
        assert_eq!(*target, ACCOUNT);
        assert_eq!(execute.txs.len(), 2);
        assert_eq!(execute.nonce, U256::from(1));
    }

    #[test]
    fn empty_batch_is_rejected() {
        let (context, keyset) = (context(), keyset());
        let assembler = TransactionAssembler::new("app", &context, ACCOUNT, &keyset);
        let err = assembler.assemble(vec![], U256::ZERO, true, None).unwrap_err();
        assert!(matches!(err, AccountError::InvalidParams(_)));
    }
}
