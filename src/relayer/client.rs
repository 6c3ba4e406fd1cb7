//! HTTP relayer client.

use super::Relayer;
use crate::{
    constants::APP_ID_HEADER,
    error::RelayerError,
    types::{
        ReceiptResponse, RelayerSimulateResult, TokensInfo,
        rpc::{Envelope, PendingExecuteCallArgs, SimulateArgs},
    },
};
use alloy::primitives::B256;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

const SIMULATE_PATH: &str = "api/v1/custom_auth/transaction/simulate";
const SEND_PATH: &str = "api/v1/custom_auth/transaction/send";
const RECEIPT_PATH: &str = "api/v1/transaction/receipt/";
const FEE_TOKENS_PATH: &str = "fee/tokens";

/// Relayer client speaking the JSON envelope protocol.
#[derive(Debug, Clone)]
pub struct RelayerClient {
    client: Client,
    url: Url,
    app_id: String,
}

impl RelayerClient {
    /// Create a new relayer client.
    ///
    /// `client` is shared with every other HTTP collaborator of the account.
    pub fn new(client: Client, mut url: Url, app_id: String) -> Self {
        if !url.path().ends_with('/') {
            url.set_path(&format!("{}/", url.path()));
        }
        Self { client, url, app_id }
    }

    /// The relayer base URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, RelayerError> {
        let response = request.header(APP_ID_HEADER, &self.app_id).send().await?;
        let status = response.status();
        let text = response.text().await?;
        decode_response(status, &text)
    }
}

/// Decodes a relayer response. A non-2xx HTTP status is an error carrying the raw body.
pub fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    text: &str,
) -> Result<Option<T>, RelayerError> {
    if !status.is_success() {
        return Err(RelayerError::Status { status: status.as_u16(), body: text.to_string() });
    }
    decode_envelope(text)
}

/// Decodes a successful response envelope.
///
/// Any `statusCode` other than `200` is an error carrying the envelope message, or the raw body
/// if the envelope has none.
pub fn decode_envelope<T: DeserializeOwned>(text: &str) -> Result<Option<T>, RelayerError> {
    let envelope: Envelope<serde_json::Value> = serde_json::from_str(text)?;
    if envelope.status_code != 200 {
        return Err(RelayerError::Status {
            status: envelope.status_code,
            body: envelope.message.unwrap_or_else(|| text.to_string()),
        });
    }
    Ok(envelope.data.map(serde_json::from_value).transpose()?)
}

#[async_trait::async_trait]
impl Relayer for RelayerClient {
    #[instrument(skip_all, fields(target = %args.target))]
    async fn simulate(&self, args: &SimulateArgs) -> Result<RelayerSimulateResult, RelayerError> {
        let url = self.url.join(SIMULATE_PATH)?;
        self.send(self.client.post(url).json(args))
            .await?
            .ok_or_else(|| RelayerError::MissingData(SIMULATE_PATH.to_string()))
    }

    #[instrument(skip_all, fields(wallet = %args.wallet_address))]
    async fn relay(&self, args: &PendingExecuteCallArgs) -> Result<B256, RelayerError> {
        let url = self.url.join(SEND_PATH)?;
        let hash = self
            .send(self.client.post(url).json(args))
            .await?
            .ok_or_else(|| RelayerError::MissingData(SEND_PATH.to_string()))?;
        debug!(%hash, "relayed execute call");
        Ok(hash)
    }

    #[instrument(skip(self))]
    async fn wait(&self, tx_hash: B256) -> Result<ReceiptResponse, RelayerError> {
        let url = self.url.join(RECEIPT_PATH)?.join(&tx_hash.to_string())?;
        Ok(self.send(self.client.get(url)).await?.unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn fee_tokens(&self) -> Result<TokensInfo, RelayerError> {
        let url = self.url.join(FEE_TOKENS_PATH)?;
        Ok(self.send(self.client.get(url)).await?.unwrap_or_default())
    }
}
