//! The smart account.
//!
//! [`SmartAccount`] gates every operation on its [`AccountStatus`], resolves the account state on
//! the active chain and drives the [`TransactionAssembler`], [`FeeNegotiator`],
//! [`SigningCoordinator`], [`RelaySubmitter`] and [`ConfirmationPoller`].
//!
//! Nonces are read fresh for every send and never cached. Concurrent sends of the same account
//! must be serialized by the caller, otherwise the relayer rejects all but one of them.

mod assembler;
pub use assembler::TransactionAssembler;

mod fees;
pub use fees::{DEFAULT_FEE_TOKEN_DECIMALS, FeeNegotiator, fee_amount, fee_options};

mod lifecycle;
pub use lifecycle::AccountStatus;
use lifecycle::{ActiveAccount, Lifecycle};

mod poller;
pub use poller::ConfirmationPoller;

mod signing;
pub use signing::{SigningCoordinator, typed_data_payload};

mod state;
pub use state::{AccountState, is_deployed, resolve_nonce_and_deployment};

mod submit;
pub use submit::{RelaySubmitter, SmartAccountResponse};

use crate::{
    chains::{ChainContext, ChainContextRegistry, ContextFactory, HttpContextFactory},
    config::AccountConfig,
    error::AccountError,
    service::{ConfigService, HttpConfigService},
    signers::MasterKeySigner,
    types::{
        FeeActionPointSig, FeeOption, FreeFeeOption, Keyset, ReceiptResult, SignedExecuteCall,
        SimulateResult, TokensInfo, Transaction,
        rpc::{SimulateArgs, StatusUpdate},
    },
};
use alloy::{
    dyn_abi::TypedData,
    primitives::{Address, B256, Bytes, ChainId, U256},
};
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Options of a fee simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulateOptions {
    /// Only price this fee token, [`Address::ZERO`] for the native token.
    pub fee_token: Option<Address>,
}

/// Options of a send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Fee paid to the relayer. No fee call is made without it.
    pub fee: Option<FeeOption>,
    /// Voucher waiving the fee.
    pub free_fee_option: Option<FreeFeeOption>,
}

/// An execute call signed but not yet relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransactions {
    /// The signed execute call.
    pub execute: SignedExecuteCall,
    /// Chain to relay on. Defaults to the active chain.
    pub chain_id: Option<ChainId>,
    /// Nonce reported with the response. Read from the chain when absent.
    pub nonce: Option<U256>,
}

/// Builder of a [`SmartAccount`].
pub struct SmartAccountBuilder {
    config: AccountConfig,
    signer: Arc<dyn MasterKeySigner>,
    client: Option<Client>,
    context_factory: Option<Arc<dyn ContextFactory>>,
    config_service: Option<Arc<dyn ConfigService>>,
}

impl SmartAccountBuilder {
    /// Sets the HTTP client shared by relayers and the config service.
    pub fn http_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets how chain contexts are built. Defaults to [`HttpContextFactory`].
    pub fn context_factory(mut self, factory: Arc<dyn ContextFactory>) -> Self {
        self.context_factory = Some(factory);
        self
    }

    /// Sets the config service. Defaults to [`HttpConfigService`] when
    /// [`AccountConfig::config_service`] is set.
    pub fn config_service(mut self, service: Arc<dyn ConfigService>) -> Self {
        self.config_service = Some(service);
        self
    }

    /// Builds the account. No I/O happens until [`SmartAccount::init`].
    pub fn build(self) -> SmartAccount {
        let client = self.client.unwrap_or_default();
        let config_service = self.config_service.or_else(|| {
            self.config
                .config_service
                .clone()
                .map(|url| -> Arc<dyn ConfigService> {
                    Arc::new(HttpConfigService::new(client.clone(), url))
                })
        });
        let context_factory =
            self.context_factory.unwrap_or_else(|| -> Arc<dyn ContextFactory> {
                Arc::new(HttpContextFactory::new(client.clone(), self.config.app_id.clone()))
            });
        let registry = ChainContextRegistry::new(
            self.config.app_id.clone(),
            self.config.chains.clone(),
            context_factory,
            config_service.clone(),
        );

        SmartAccount {
            config: self.config,
            signer: self.signer,
            registry,
            config_service,
            lifecycle: Lifecycle::Uninitialized,
        }
    }
}

impl std::fmt::Debug for SmartAccountBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartAccountBuilder").field("config", &self.config).finish_non_exhaustive()
    }
}

/// A smart contract account transacting through relayers.
pub struct SmartAccount {
    config: AccountConfig,
    signer: Arc<dyn MasterKeySigner>,
    registry: ChainContextRegistry,
    config_service: Option<Arc<dyn ConfigService>>,
    lifecycle: Lifecycle,
}

impl SmartAccount {
    /// Returns a builder for an account controlled by `signer`.
    pub fn builder(config: AccountConfig, signer: Arc<dyn MasterKeySigner>) -> SmartAccountBuilder {
        SmartAccountBuilder {
            config,
            signer,
            client: None,
            context_factory: None,
            config_service: None,
        }
    }

    /// Creates an account with the default HTTP collaborators.
    pub fn new(config: AccountConfig, signer: Arc<dyn MasterKeySigner>) -> Self {
        Self::builder(config, signer).build()
    }

    /// Initializes the account on `chain_id`.
    ///
    /// Resolves missing relayer endpoints, binds the active chain and builds the keyset
    /// around the master key signer. Initializing again replaces the identity, a destroyed
    /// account can never be initialized.
    #[instrument(skip(self))]
    pub async fn init(&mut self, chain_id: ChainId) -> Result<(), AccountError> {
        self.lifecycle.ensure_not_destroyed()?;

        self.registry.resolve_relayer_urls().await;
        let chain = self.registry.get(chain_id)?;

        let signer_address = self
            .signer
            .address()
            .await
            .map_err(|err| AccountError::InvalidSigner(format!("Got Address Failed: {err}")))?;

        let keyset = match &self.config.keyset_json {
            Some(json) => {
                Keyset::from_json(json)?.with_master_signer(signer_address, self.signer.clone())?
            }
            None => Keyset::from_master(signer_address, self.signer.clone()),
        };
        let address = self
            .config
            .address
            .unwrap_or_else(|| self.config.context.account_address(keyset.hash()));
        info!(%address, %signer_address, "initialized account");

        self.lifecycle = Lifecycle::Initialized(Box::new(ActiveAccount {
            address,
            keyset,
            signer_address,
            chain,
        }));
        Ok(())
    }

    /// The lifecycle state.
    pub fn status(&self) -> AccountStatus {
        self.lifecycle.status()
    }

    /// The account address.
    pub fn address(&self) -> Result<Address, AccountError> {
        Ok(self.lifecycle.active()?.address)
    }

    /// The active chain.
    pub fn chain_id(&self) -> Result<ChainId, AccountError> {
        Ok(self.lifecycle.active()?.chain.chain_id)
    }

    /// The keyset controlling the account.
    pub fn keyset(&self) -> Result<&Keyset, AccountError> {
        Ok(&self.lifecycle.active()?.keyset)
    }

    /// The master key signer.
    pub fn signer(&self) -> Result<Arc<dyn MasterKeySigner>, AccountError> {
        self.lifecycle.active()?;
        Ok(self.signer.clone())
    }

    /// Address of the master key signer.
    pub fn signer_address(&self) -> Result<Address, AccountError> {
        Ok(self.lifecycle.active()?.signer_address)
    }

    /// Whether the account is deployed on the active chain.
    pub async fn is_deployed(&self) -> Result<bool, AccountError> {
        let active = self.lifecycle.active()?;
        is_deployed(active.chain.reader.as_ref(), active.address).await
    }

    /// The account's current nonce on the active chain.
    pub async fn nonce(&self) -> Result<U256, AccountError> {
        Ok(self.state().await?.nonce)
    }

    /// The deployment status and nonce on the active chain.
    pub async fn state(&self) -> Result<AccountState, AccountError> {
        let active = self.lifecycle.active()?;
        resolve_nonce_and_deployment(active.chain.reader.as_ref(), active.address).await
    }

    /// Fee tokens accepted by the active relayer.
    pub async fn fee_tokens(&self) -> Result<TokensInfo, AccountError> {
        let active = self.lifecycle.active()?;
        Ok(active.chain.relayer.fee_tokens().await?)
    }

    /// Simulates a single call, see [`Self::simulate_transaction_batch`].
    pub async fn simulate_transaction(
        &self,
        tx: Transaction,
        options: SimulateOptions,
    ) -> Result<SimulateResult, AccountError> {
        self.simulate_transaction_batch(vec![tx], options).await
    }

    /// Simulates `txs` and returns the fee options of relaying them.
    #[instrument(skip_all, fields(txs = txs.len()))]
    pub async fn simulate_transaction_batch(
        &self,
        txs: Vec<Transaction>,
        options: SimulateOptions,
    ) -> Result<SimulateResult, AccountError> {
        let active = self.lifecycle.active()?;
        let state =
            resolve_nonce_and_deployment(active.chain.reader.as_ref(), active.address).await?;
        let execute = self.assembler(active).assemble(txs, state.nonce, state.is_deployed, None)?;

        let args = SimulateArgs::new(active.address, &active.keyset, execute, options.fee_token);
        FeeNegotiator::new(active.chain.relayer.as_ref()).simulate(&args).await
    }

    /// Sends a single call, see [`Self::send_transaction_batch`].
    pub async fn send_transaction(
        &self,
        tx: Transaction,
        options: SendOptions,
    ) -> Result<SmartAccountResponse, AccountError> {
        self.send_transaction_batch(vec![tx], options).await
    }

    /// Signs `txs` and relays them on the active chain.
    ///
    /// The returned hash is the relayer's, not the chain transaction hash.
    #[instrument(skip_all, fields(txs = txs.len()))]
    pub async fn send_transaction_batch(
        &self,
        txs: Vec<Transaction>,
        options: SendOptions,
    ) -> Result<SmartAccountResponse, AccountError> {
        let active = self.lifecycle.active()?;
        let SendOptions { fee, free_fee_option } = options;

        let (execute, nonce) = self.sign_execute(active, txs, fee.as_ref(), true).await?;
        self.relay(active, &active.chain, execute, nonce, None, free_fee_option).await
    }

    /// Signs `txs` without relaying them.
    #[instrument(skip_all, fields(txs = txs.len()))]
    pub async fn sign_transactions(
        &self,
        txs: Vec<Transaction>,
        options: SendOptions,
    ) -> Result<SignedTransactions, AccountError> {
        let active = self.lifecycle.active()?;
        let (execute, nonce) = self.sign_execute(active, txs, options.fee.as_ref(), false).await?;
        Ok(SignedTransactions {
            execute,
            chain_id: Some(active.chain.chain_id),
            nonce: Some(nonce),
        })
    }

    /// Relays transactions signed with [`Self::sign_transactions`].
    pub async fn send_signed_transactions(
        &self,
        signed: SignedTransactions,
        fee_action_point_sig: Option<FeeActionPointSig>,
        free_fee_option: Option<FreeFeeOption>,
    ) -> Result<SmartAccountResponse, AccountError> {
        let active = self.lifecycle.active()?;
        let chain = match signed.chain_id {
            Some(chain_id) if chain_id != active.chain.chain_id => self.registry.get(chain_id)?,
            _ => active.chain.clone(),
        };
        let nonce = match signed.nonce {
            Some(nonce) => nonce,
            None => {
                resolve_nonce_and_deployment(chain.reader.as_ref(), active.address).await?.nonce
            }
        };
        self.relay(active, &chain, signed.execute, nonce, fee_action_point_sig, free_fee_option)
            .await
    }

    /// Waits for the receipt of a relayed transaction.
    ///
    /// Polls the relayer of `chain_id`, or of the active chain, once per second for at most
    /// `timeout` seconds. `confirmations` defaults to one and the timeout to the configured one.
    pub async fn wait_transaction_by_receipt(
        &self,
        tx_hash: B256,
        confirmations: Option<u64>,
        chain_id: Option<ChainId>,
        timeout: Option<u64>,
    ) -> Result<ReceiptResult, AccountError> {
        let active = self.lifecycle.active()?;
        let relayer = match chain_id {
            Some(chain_id) => self.registry.get(chain_id)?.relayer,
            None => active.chain.relayer.clone(),
        };
        ConfirmationPoller::new(relayer)
            .wait_for_receipt(
                tx_hash,
                confirmations.unwrap_or(1),
                timeout.unwrap_or(self.config.timeout),
            )
            .await
    }

    /// Makes `chain_id` the active chain. Identity and keyset are kept.
    ///
    /// Must not be called while another operation of the account is in flight.
    pub fn switch_chain(&mut self, chain_id: ChainId) -> Result<(), AccountError> {
        self.lifecycle.active()?;
        let chain = self.registry.get(chain_id)?;
        self.lifecycle.active_mut()?.chain = chain;
        debug!(chain_id, "switched chain");
        Ok(())
    }

    /// Signs `message` with the master key, see [`Self::sign_digest`].
    pub async fn sign_message(&self, message: &[u8]) -> Result<Bytes, AccountError> {
        self.sign_digest(message).await
    }

    /// Signs `message` with the master key.
    ///
    /// Signatures of undeployed accounts are wrapped per EIP-6492.
    pub async fn sign_digest(&self, message: &[u8]) -> Result<Bytes, AccountError> {
        let active = self.lifecycle.active()?;
        let deployed = is_deployed(active.chain.reader.as_ref(), active.address).await?;
        Ok(self.signing(active).sign_digest(message, deployed).await?)
    }

    /// Signs `message` with the EIP-712 key.
    ///
    /// Signatures of undeployed accounts are wrapped per EIP-6492.
    pub async fn sign_digest_712(&self, message: &[u8]) -> Result<Bytes, AccountError> {
        let active = self.lifecycle.active()?;
        let deployed = is_deployed(active.chain.reader.as_ref(), active.address).await?;
        Ok(self.signing(active).sign_digest_712(message, deployed).await?)
    }

    /// Signs EIP-712 typed data with the EIP-712 key.
    pub async fn sign_typed_data(&self, typed_data: &TypedData) -> Result<Bytes, AccountError> {
        self.lifecycle.active()?;
        let payload = typed_data_payload(typed_data)?;
        self.sign_digest_712(payload.as_bytes()).await
    }

    /// Destroys the account, clearing the signer's session when it supports it.
    ///
    /// The account rejects every operation afterwards.
    pub async fn destroy(&mut self) -> Result<(), AccountError> {
        self.lifecycle.ensure_not_destroyed()?;
        if let Some(clearable) = self.signer.as_clearable() {
            clearable.clear().await?;
        }
        self.lifecycle = Lifecycle::Destroyed;
        info!("destroyed account");
        Ok(())
    }

    fn assembler<'a>(&'a self, active: &'a ActiveAccount) -> TransactionAssembler<'a> {
        TransactionAssembler::new(
            &self.config.app_id,
            &self.config.context,
            active.address,
            &active.keyset,
        )
    }

    fn signing<'a>(&'a self, active: &'a ActiveAccount) -> SigningCoordinator<'a> {
        SigningCoordinator::new(
            &active.keyset,
            &self.config.context,
            active.address,
            active.chain.chain_id,
        )
    }

    /// Assembles and signs `txs`, returning the signed call and the nonce it was signed for.
    async fn sign_execute(
        &self,
        active: &ActiveAccount,
        txs: Vec<Transaction>,
        fee: Option<&FeeOption>,
        report_status: bool,
    ) -> Result<(SignedExecuteCall, U256), AccountError> {
        let fee_call = FeeNegotiator::build_fee_call(fee);
        let state =
            resolve_nonce_and_deployment(active.chain.reader.as_ref(), active.address).await?;
        let execute =
            self.assembler(active).assemble(txs, state.nonce, state.is_deployed, fee_call)?;
        let nonce = execute.main().map(|main| main.nonce).unwrap_or(state.nonce);

        if report_status {
            self.update_status(active);
        }

        let signed =
            self.signing(active).sign_execute(execute).await.map_err(AccountError::sending)?;
        Ok((signed, nonce))
    }

    async fn relay(
        &self,
        active: &ActiveAccount,
        chain: &ChainContext,
        execute: SignedExecuteCall,
        nonce: U256,
        fee_action_point_sig: Option<FeeActionPointSig>,
        free_fee_option: Option<FreeFeeOption>,
    ) -> Result<SmartAccountResponse, AccountError> {
        let submitter = RelaySubmitter::new(chain.relayer.clone());
        let wallet_address =
            execute.wallet_address(active.address, self.config.context.module_guest);
        let hash = submitter
            .submit(&execute, wallet_address, fee_action_point_sig, free_fee_option)
            .await?;
        Ok(submitter.response(
            hash,
            active.address,
            chain.chain_id,
            nonce,
            &execute,
            self.config.timeout,
        ))
    }

    /// Reports the account to the config service in the background. Failures are only logged.
    fn update_status(&self, active: &ActiveAccount) {
        let Some(service) = self.config_service.clone() else { return };
        let update = StatusUpdate {
            app_id: self.config.app_id.clone(),
            chain_id: active.chain.chain_id,
            address: active.address,
        };
        tokio::spawn(async move {
            if let Err(err) = service.update_status(&update).await {
                warn!(%err, chain_id = update.chain_id, "failed to update account status");
            }
        });
    }
}

impl std::fmt::Debug for SmartAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartAccount")
            .field("app_id", &self.config.app_id)
            .field("status", &self.status())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
