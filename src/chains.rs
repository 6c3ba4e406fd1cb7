//! Per-chain provider and relayer pairs.

use crate::{
    config::ChainOption,
    error::AccountError,
    provider::{ChainReader, connect_http},
    relayer::{Relayer, RelayerClient},
    service::ConfigService,
};
use alloy::primitives::ChainId;
use dashmap::DashMap;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

/// Chain reader and relayer serving one chain.
#[derive(Clone)]
pub struct ChainContext {
    /// The chain ID.
    pub chain_id: ChainId,
    /// Read-only access to the chain.
    pub reader: Arc<dyn ChainReader>,
    /// The relayer serving the chain.
    pub relayer: Arc<dyn Relayer>,
}

impl std::fmt::Debug for ChainContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainContext").field("chain_id", &self.chain_id).finish_non_exhaustive()
    }
}

/// Builds the [`ChainContext`] of a chain from its endpoints.
pub trait ContextFactory: Send + Sync {
    /// Creates the context of `chain`, relayed through `relayer_url`.
    fn create(&self, chain: &ChainOption, relayer_url: Url) -> ChainContext;
}

/// [`ContextFactory`] connecting HTTP providers and [`RelayerClient`]s.
#[derive(Debug, Clone)]
pub struct HttpContextFactory {
    client: Client,
    app_id: String,
}

impl HttpContextFactory {
    /// Creates a new factory sharing `client` across relayers.
    pub fn new(client: Client, app_id: String) -> Self {
        Self { client, app_id }
    }
}

impl ContextFactory for HttpContextFactory {
    fn create(&self, chain: &ChainOption, relayer_url: Url) -> ChainContext {
        ChainContext {
            chain_id: chain.chain_id,
            reader: Arc::new(connect_http(chain.rpc_url.clone())),
            relayer: Arc::new(RelayerClient::new(
                self.client.clone(),
                relayer_url,
                self.app_id.clone(),
            )),
        }
    }
}

/// Supported chains and their lazily built contexts.
pub struct ChainContextRegistry {
    app_id: String,
    chains: Vec<ChainOption>,
    /// Relayer endpoints resolved through the config service.
    resolved: DashMap<ChainId, Url>,
    contexts: DashMap<ChainId, ChainContext>,
    factory: Arc<dyn ContextFactory>,
    config_service: Option<Arc<dyn ConfigService>>,
}

impl ChainContextRegistry {
    /// Creates a new registry. Nothing is connected until a context is requested.
    pub fn new(
        app_id: String,
        chains: Vec<ChainOption>,
        factory: Arc<dyn ContextFactory>,
        config_service: Option<Arc<dyn ConfigService>>,
    ) -> Self {
        Self {
            app_id,
            chains,
            resolved: DashMap::new(),
            contexts: DashMap::new(),
            factory,
            config_service,
        }
    }

    /// Resolves the relayer endpoint of every chain configured without one.
    ///
    /// Lookups run concurrently. A failed lookup leaves the chain unsupported and is only
    /// logged.
    #[instrument(skip_all)]
    pub async fn resolve_relayer_urls(&self) {
        let Some(service) = &self.config_service else { return };

        let pending = self.chains.iter().filter(|chain| {
            chain.relayer_url.is_none() && !self.resolved.contains_key(&chain.chain_id)
        });
        let lookups = pending.map(|chain| async move {
            (chain.chain_id, service.relayer_url(&self.app_id, chain.chain_id).await)
        });

        for (chain_id, result) in futures_util::future::join_all(lookups).await {
            match result {
                Ok(url) => {
                    debug!(chain_id, %url, "resolved relayer url");
                    self.resolved.insert(chain_id, url);
                }
                Err(err) => warn!(chain_id, %err, "failed to resolve relayer url"),
            }
        }
    }

    /// Returns the relayer endpoint of `chain_id`.
    pub fn relayer_url(&self, chain_id: ChainId) -> Result<Url, AccountError> {
        let chain = self.option(chain_id)?;
        chain
            .relayer_url
            .clone()
            .or_else(|| self.resolved.get(&chain_id).map(|url| url.clone()))
            .ok_or(AccountError::UnsupportedChain(chain_id))
    }

    /// Returns the context of `chain_id`, building it on first use.
    pub fn get(&self, chain_id: ChainId) -> Result<ChainContext, AccountError> {
        if let Some(context) = self.contexts.get(&chain_id) {
            return Ok(context.clone());
        }

        let chain = self.option(chain_id)?;
        let relayer_url = self.relayer_url(chain_id)?;
        let context = self
            .contexts
            .entry(chain_id)
            .or_insert_with(|| self.factory.create(chain, relayer_url))
            .clone();
        Ok(context)
    }

    fn option(&self, chain_id: ChainId) -> Result<&ChainOption, AccountError> {
        self.chains
            .iter()
            .find(|chain| chain.chain_id == chain_id)
            .ok_or(AccountError::UnsupportedChain(chain_id))
    }
}

impl std::fmt::Debug for ChainContextRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainContextRegistry")
            .field("chains", &self.chains)
            .field("connected", &self.contexts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::RelayerError,
        types::{
            ReceiptResponse, RelayerSimulateResult, TokensInfo,
            rpc::{PendingExecuteCallArgs, SimulateArgs, StatusUpdate},
        },
    };
    use alloy::{
        primitives::{Address, B256, Bytes},
        transports::TransportResult,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Noop;

    #[async_trait::async_trait]
    impl ChainReader for Noop {
        async fn code_at(&self, _: Address) -> TransportResult<Bytes> {
            Ok(Bytes::new())
        }

        async fn call(&self, _: Address, _: Bytes) -> TransportResult<Bytes> {
            Ok(Bytes::new())
        }
    }

    #[async_trait::async_trait]
    impl Relayer for Noop {
        async fn simulate(&self, _: &SimulateArgs) -> Result<RelayerSimulateResult, RelayerError> {
            Err(RelayerError::MissingData("noop".to_string()))
        }

        async fn relay(&self, _: &PendingExecuteCallArgs) -> Result<B256, RelayerError> {
            Ok(B256::ZERO)
        }

        async fn wait(&self, _: B256) -> Result<ReceiptResponse, RelayerError> {
            Ok(ReceiptResponse::default())
        }

        async fn fee_tokens(&self) -> Result<TokensInfo, RelayerError> {
            Ok(TokensInfo::default())
        }
    }

    #[derive(Default)]
    struct CountingFactory(AtomicUsize);

    impl ContextFactory for CountingFactory {
        fn create(&self, chain: &ChainOption, _: Url) -> ChainContext {
            self.0.fetch_add(1, Ordering::SeqCst);
            ChainContext {
                chain_id: chain.chain_id,
                reader: Arc::new(Noop),
                relayer: Arc::new(Noop),
            }
        }
    }

    struct StaticService;

    #[async_trait::async_trait]
    impl ConfigService for StaticService {
        async fn relayer_url(&self, _: &str, chain_id: ChainId) -> eyre::Result<Url> {
            if chain_id == 137 {
                Ok("https://polygon.relayer.example".parse()?)
            } else {
                eyre::bail!("unknown chain {chain_id}")
            }
        }

        async fn update_status(&self, _: &StatusUpdate) -> eyre::Result<()> {
            Ok(())
        }
    }

    fn chains() -> Vec<ChainOption> {
        vec![
            ChainOption::new(1, "http://localhost:8545".parse().unwrap())
                .with_relayer_url("https://relayer.example".parse().unwrap()),
            ChainOption::new(137, "http://localhost:8546".parse().unwrap()),
            ChainOption::new(56, "http://localhost:8547".parse().unwrap()),
        ]
    }

    #[test]
    fn contexts_are_cached() {
        let factory = Arc::new(CountingFactory::default());
        let registry =
            ChainContextRegistry::new("app".to_string(), chains(), factory.clone(), None);
        assert_eq!(registry.get(1).unwrap().chain_id, 1);
        assert_eq!(registry.get(1).unwrap().chain_id, 1);
        assert_eq!(factory.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_chain_is_unsupported() {
        let registry = ChainContextRegistry::new(
            "app".to_string(),
            chains(),
            Arc::new(CountingFactory::default()),
            None,
        );
        assert!(matches!(registry.get(10), Err(AccountError::UnsupportedChain(10))));
        // configured but without relayer
        assert!(matches!(registry.get(137), Err(AccountError::UnsupportedChain(137))));
    }

    #[tokio::test]
    async fn resolves_missing_relayers() {
        let registry = ChainContextRegistry::new(
            "app".to_string(),
            chains(),
            Arc::new(CountingFactory::default()),
            Some(Arc::new(StaticService)),
        );
        registry.resolve_relayer_urls().await;
        assert_eq!(
            registry.relayer_url(137).unwrap().as_str(),
            "https://polygon.relayer.example/"
        );
        assert_eq!(registry.relayer_url(1).unwrap().as_str(), "https://relayer.example/");
        assert!(matches!(registry.get(56), Err(AccountError::UnsupportedChain(56))));
    }
}
