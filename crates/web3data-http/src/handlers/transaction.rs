//! Transaction endpoints (`transactions/...`).

use web3data_core::Result;

use crate::client::{ApiResponse, RestClient};
use crate::params::QueryParams;

#[derive(Debug, Clone, Copy)]
pub struct TransactionHandler<'a> {
    client: &'a RestClient,
}

impl<'a> TransactionHandler<'a> {
    pub fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    async fn query(&self, route: &str, params: &QueryParams) -> Result<ApiResponse> {
        let base = self.client.resource("transactions/");
        self.client.query(&base, route, params).await
    }

    /// A single transaction by hash.
    pub async fn information(&self, tx_hash: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(tx_hash, params).await
    }

    pub async fn token_transfers(&self, tx_hash: &str) -> Result<ApiResponse> {
        self.client.ensure_supported("transaction.token_transfers")?;
        self.query(&format!("{tx_hash}/token-transfers"), &QueryParams::new())
            .await
    }

    /// Search transactions (`blockNumber`, `from`, `to`, `startDate`, ...).
    pub async fn find(&self, params: &QueryParams) -> Result<ApiResponse> {
        self.query("", params).await
    }

    pub async fn gas_percentiles(&self, params: &QueryParams) -> Result<ApiResponse> {
        self.client.ensure_supported("transaction.gas_percentiles")?;
        self.query("gas/percentiles", params).await
    }

    /// Gas price predictions for the next blocks.
    pub async fn gas_predictions(&self) -> Result<ApiResponse> {
        self.client.ensure_supported("transaction.gas_predictions")?;
        self.query("gas/predictions", &QueryParams::new()).await
    }

    pub async fn metrics(&self) -> Result<ApiResponse> {
        self.query("metrics/latest", &QueryParams::new()).await
    }

    pub async fn volume(&self, params: &QueryParams) -> Result<ApiResponse> {
        self.query("volume", params).await
    }
}
