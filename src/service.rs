//! Backend config service resolving relayer endpoints and tracking account activity.

use crate::{
    constants::APP_ID_HEADER,
    relayer::decode_envelope,
    types::rpc::{ChainConfigResponse, StatusUpdate},
};
use alloy::primitives::ChainId;
use eyre::{OptionExt, Result};
use reqwest::Client;
use tracing::instrument;
use url::Url;

const CONFIG_PATH: &str = "api/v1/custom_auth/config";
const STATUS_PATH: &str = "api/v1/custom_auth/status";

/// Backend the account consults for per-chain configuration.
#[async_trait::async_trait]
pub trait ConfigService: Send + Sync {
    /// Returns the relayer serving `chain_id` for `app_id`.
    async fn relayer_url(&self, app_id: &str, chain_id: ChainId) -> Result<Url>;

    /// Reports account activity.
    async fn update_status(&self, update: &StatusUpdate) -> Result<()>;
}

/// [`ConfigService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpConfigService {
    client: Client,
    url: Url,
}

impl HttpConfigService {
    /// Create a new config service client.
    pub fn new(client: Client, mut url: Url) -> Self {
        if !url.path().ends_with('/') {
            url.set_path(&format!("{}/", url.path()));
        }
        Self { client, url }
    }
}

#[async_trait::async_trait]
impl ConfigService for HttpConfigService {
    #[instrument(skip(self))]
    async fn relayer_url(&self, app_id: &str, chain_id: ChainId) -> Result<Url> {
        let mut url = self.url.join(CONFIG_PATH)?;
        url.query_pairs_mut()
            .append_pair("appId", app_id)
            .append_pair("chainId", &chain_id.to_string());

        let response = self.client.get(url).header(APP_ID_HEADER, app_id).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            eyre::bail!("config service responded with status {status}: {text}");
        }
        let config: ChainConfigResponse =
            decode_envelope(&text)?.ok_or_eyre("config service returned no chain config")?;
        Ok(config.relayer_url)
    }

    #[instrument(skip_all, fields(chain_id = update.chain_id, address = %update.address))]
    async fn update_status(&self, update: &StatusUpdate) -> Result<()> {
        let response = self
            .client
            .post(self.url.join(STATUS_PATH)?)
            .header(APP_ID_HEADER, &update.app_id)
            .json(update)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            eyre::bail!("config service responded with status {status}: {text}");
        }
        decode_envelope::<serde_json::Value>(&text)?;
        Ok(())
    }
}
