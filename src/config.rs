//! Smart account configuration.

use crate::{constants::DEFAULT_TIMEOUT, types::WalletContext};
use alloy::primitives::{Address, ChainId};
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use url::Url;

/// Endpoints of a supported chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainOption {
    /// The chain ID.
    pub chain_id: ChainId,
    /// RPC endpoint used for chain reads.
    pub rpc_url: Url,
    /// Relayer endpoint. Resolved through the config service when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relayer_url: Option<Url>,
}

impl ChainOption {
    /// Creates a new chain option.
    pub fn new(chain_id: ChainId, rpc_url: Url) -> Self {
        Self { chain_id, rpc_url, relayer_url: None }
    }

    /// Sets the relayer endpoint.
    pub fn with_relayer_url(mut self, relayer_url: Url) -> Self {
        self.relayer_url = Some(relayer_url);
        self
    }
}

/// Smart account configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// App id sent with every relayer request.
    pub app_id: String,
    /// Supported chains.
    pub chains: Vec<ChainOption>,
    /// Backend resolving missing relayer endpoints and receiving status updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_service: Option<Url>,
    /// Contracts the account is deployed from.
    pub context: WalletContext,
    /// Keyset json of an existing account. The default master keyset is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyset_json: Option<String>,
    /// Address of an existing account. Derived from the keyset when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Seconds to wait for a receipt. One relayer poll is made per second.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT
}

impl AccountConfig {
    /// Creates a config for `app_id` without any chain.
    pub fn new(app_id: impl Into<String>, context: WalletContext) -> Self {
        Self {
            app_id: app_id.into(),
            chains: Vec::new(),
            config_service: None,
            context,
            keyset_json: None,
            address: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Adds a supported chain, replacing any option for the same chain id.
    pub fn with_chain(mut self, chain: ChainOption) -> Self {
        self.chains.retain(|c| c.chain_id != chain.chain_id);
        self.chains.push(chain);
        self
    }

    /// Sets the config service endpoint.
    pub fn with_config_service(mut self, config_service: Option<Url>) -> Self {
        self.config_service = config_service;
        self
    }

    /// Sets the keyset json.
    pub fn with_keyset_json(mut self, keyset_json: Option<String>) -> Self {
        self.keyset_json = keyset_json;
        self
    }

    /// Sets the account address.
    pub fn with_address(mut self, address: Option<Address>) -> Self {
        self.address = address;
        self
    }

    /// Sets the receipt timeout in seconds.
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    /// The receipt timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Returns the option of `chain_id`, if supported.
    pub fn chain(&self, chain_id: ChainId) -> Option<&ChainOption> {
        self.chains.iter().find(|chain| chain.chain_id == chain_id)
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        let config = serde_yaml::from_reader(&file)
            .wrap_err_with(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}
