//! Read-only chain access.

use alloy::{
    primitives::{Address, Bytes},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    transports::TransportResult,
};
use tracing::{instrument, trace};
use url::Url;

/// The chain reads an account needs: code presence and `eth_call`.
#[async_trait::async_trait]
pub trait ChainReader: Send + Sync {
    /// Returns the code deployed at `address` on the latest block.
    async fn code_at(&self, address: Address) -> TransportResult<Bytes>;

    /// Executes `data` against `to` with `eth_call` on the latest block.
    async fn call(&self, to: Address, data: Bytes) -> TransportResult<Bytes>;
}

#[async_trait::async_trait]
impl ChainReader for DynProvider {
    #[instrument(skip(self))]
    async fn code_at(&self, address: Address) -> TransportResult<Bytes> {
        let code = self.get_code_at(address).await?;
        trace!(len = code.len(), "fetched code");
        Ok(code)
    }

    #[instrument(skip(self, data))]
    async fn call(&self, to: Address, data: Bytes) -> TransportResult<Bytes> {
        Provider::call(self, TransactionRequest::default().to(to).input(data.into())).await
    }
}

/// Connects a read-only HTTP provider to `rpc_url`.
pub fn connect_http(rpc_url: Url) -> DynProvider {
    ProviderBuilder::new().connect_http(rpc_url).erased()
}
