//! Relaying signed execute calls.

use super::poller::ConfirmationPoller;
use crate::{
    error::AccountError,
    relayer::Relayer,
    types::{
        FeeActionPointSig, FreeFeeOption, ReceiptResult, SignedExecuteCall,
        rpc::PendingExecuteCallArgs,
    },
};
use alloy::primitives::{Address, B256, Bytes, ChainId, U256};
use std::sync::Arc;
use tracing::{info, instrument};

/// Hands signed execute calls to a relayer.
#[derive(Clone)]
pub struct RelaySubmitter {
    relayer: Arc<dyn Relayer>,
}

impl RelaySubmitter {
    /// Creates a submitter relaying through `relayer`.
    pub fn new(relayer: Arc<dyn Relayer>) -> Self {
        Self { relayer }
    }

    /// Relays `execute` to `wallet_address`, returning the relayer transaction hash.
    #[instrument(skip_all, fields(%wallet_address))]
    pub async fn submit(
        &self,
        execute: &SignedExecuteCall,
        wallet_address: Address,
        fee_action_point_sig: Option<FeeActionPointSig>,
        free_fee_option: Option<FreeFeeOption>,
    ) -> Result<B256, AccountError> {
        let args = PendingExecuteCallArgs::new(
            execute,
            wallet_address,
            fee_action_point_sig,
            free_fee_option,
        )
        .map_err(|err| AccountError::sending(eyre::Report::new(err)))?;
        let hash = self.relayer.relay(&args).await.map_err(AccountError::sending)?;
        info!(%hash, "execute call relayed");
        Ok(hash)
    }

    /// Builds the response of a relayed `execute`.
    pub fn response(
        &self,
        hash: B256,
        from: Address,
        chain_id: ChainId,
        nonce: U256,
        execute: &SignedExecuteCall,
        timeout: u64,
    ) -> SmartAccountResponse {
        SmartAccountResponse {
            hash,
            from,
            chain_id,
            nonce,
            gas_limit: U256::ZERO,
            value: U256::ZERO,
            data: execute.calldata(),
            confirmations: 1,
            timeout,
            poller: ConfirmationPoller::new(self.relayer.clone()),
        }
    }
}

impl std::fmt::Debug for RelaySubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelaySubmitter").finish_non_exhaustive()
    }
}

/// A relayed execute call.
///
/// `hash` is the relayer's transaction hash, not the hash of the chain transaction.
#[derive(Clone)]
pub struct SmartAccountResponse {
    /// Relayer transaction hash.
    pub hash: B256,
    /// The account address.
    pub from: Address,
    /// The chain the call was relayed on.
    pub chain_id: ChainId,
    /// Nonce of the account execute.
    pub nonce: U256,
    /// Always zero, gas is paid by the relayer.
    pub gas_limit: U256,
    /// Always zero.
    pub value: U256,
    /// Calldata of the relayed transaction.
    pub data: Bytes,
    /// Confirmations reported with the response.
    pub confirmations: u64,
    /// Default receipt timeout in seconds.
    timeout: u64,
    poller: ConfirmationPoller,
}

impl SmartAccountResponse {
    /// Waits for the receipt of the relayed call.
    ///
    /// Defaults to one confirmation and the account's configured timeout.
    pub async fn wait(
        &self,
        confirmations: Option<u64>,
        timeout: Option<u64>,
    ) -> Result<ReceiptResult, AccountError> {
        self.poller
            .wait_for_receipt(
                self.hash,
                confirmations.unwrap_or(1),
                timeout.unwrap_or(self.timeout),
            )
            .await
    }
}

impl std::fmt::Debug for SmartAccountResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartAccountResponse")
            .field("hash", &self.hash)
            .field("from", &self.from)
            .field("chain_id", &self.chain_id)
            .field("nonce", &self.nonce)
            .field("confirmations", &self.confirmations)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{RelayerError, SIGNATURE_MISSING},
        types::{
            MainExecute, ReceiptResponse, RelayerSimulateResult, TokensInfo, rpc::SimulateArgs,
        },
    };
    use alloy::primitives::{address, b256, bytes};
    use std::sync::Mutex;

    const HASH: B256 = b256!("0x1111111111111111111111111111111111111111111111111111111111111111");

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<PendingExecuteCallArgs>>,
        fail_with: Option<String>,
    }

    #[async_trait::async_trait]
    impl Relayer for Recorder {
        async fn simulate(&self, _: &SimulateArgs) -> Result<RelayerSimulateResult, RelayerError> {
            unreachable!()
        }

        async fn relay(&self, args: &PendingExecuteCallArgs) -> Result<B256, RelayerError> {
            if let Some(body) = &self.fail_with {
                return Err(RelayerError::Status { status: 400, body: body.clone() });
            }
            self.sent.lock().unwrap().push(args.clone());
            Ok(HASH)
        }

        async fn wait(&self, _: B256) -> Result<ReceiptResponse, RelayerError> {
            Ok(ReceiptResponse::default())
        }

        async fn fee_tokens(&self) -> Result<TokensInfo, RelayerError> {
            unreachable!()
        }
    }

    fn signed() -> SignedExecuteCall {
        SignedExecuteCall::Main(
            MainExecute { txs: vec![], nonce: U256::from(3), signer_indexes: vec![0] }
                .into_signed(bytes!("0x0102")),
        )
    }

    #[tokio::test]
    async fn submits_payload() {
        let relayer = Arc::new(Recorder::default());
        let submitter = RelaySubmitter::new(relayer.clone());
        let wallet = address!("0x00000000000000000000000000000000000000cc");
        let free = FreeFeeOption { signature: bytes!("0xaa"), expires: 10 };

        let hash = submitter.submit(&signed(), wallet, None, Some(free.clone())).await.unwrap();
        assert_eq!(hash, HASH);

        let sent = relayer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].wallet_address, wallet);
        assert_eq!(sent[0].free_fee_option, Some(free));
        assert!(sent[0].fee_action_point_sig.is_none());
    }

    #[tokio::test]
    async fn relay_failures_are_send_failures() {
        let relayer =
            Arc::new(Recorder { fail_with: Some("bad nonce".to_string()), ..Default::default() });
        let err = RelaySubmitter::new(relayer)
            .submit(&signed(), Address::ZERO, None, None)
            .await
            .unwrap_err();
        let AccountError::SendFailed(msg) = err else { panic!("expected send failure") };
        assert!(msg.contains("bad nonce"));
    }

    #[tokio::test]
    async fn relayed_missing_signature_keeps_variant() {
        let relayer = Arc::new(Recorder {
            fail_with: Some(SIGNATURE_MISSING.to_string()),
            ..Default::default()
        });
        let err = RelaySubmitter::new(relayer)
            .submit(&signed(), Address::ZERO, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::SignatureMissing));
    }

    #[test]
    fn response_shape() {
        let submitter = RelaySubmitter::new(Arc::new(Recorder::default()));
        let from = address!("0x00000000000000000000000000000000000000cc");
        let response = submitter.response(HASH, from, 42, U256::from(3), &signed(), 60);
        assert_eq!(response.hash, HASH);
        assert_eq!(response.from, from);
        assert_eq!(response.chain_id, 42);
        assert_eq!(response.gas_limit, U256::ZERO);
        assert_eq!(response.value, U256::ZERO);
        assert_eq!(response.confirmations, 1);
        assert_eq!(response.data, signed().calldata());
    }
}
