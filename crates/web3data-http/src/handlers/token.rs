//! Token endpoints (`tokens/{address}/...`). Gated on limited chains.

use web3data_core::Result;

use crate::client::{ApiResponse, RestClient};
use crate::params::QueryParams;

#[derive(Debug, Clone, Copy)]
pub struct TokenHandler<'a> {
    client: &'a RestClient,
}

impl<'a> TokenHandler<'a> {
    pub fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    async fn query(
        &self,
        operation: &'static str,
        address: &str,
        route: &str,
        params: &QueryParams,
    ) -> Result<ApiResponse> {
        self.client.ensure_supported(operation)?;
        let base = self.client.resource(&format!("tokens/{address}/"));
        self.client.query(&base, route, params).await
    }

    pub async fn holders_historical(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query("token.holders_historical", address, "holders/historical", params)
            .await
    }

    pub async fn holders_latest(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query("token.holders_latest", address, "holders/latest", params)
            .await
    }

    pub async fn supply_historical(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query("token.supply_historical", address, "supplies/historical", params)
            .await
    }

    /// Current circulating and total supply.
    pub async fn supply_latest(&self, address: &str) -> Result<ApiResponse> {
        self.query("token.supply_latest", address, "supplies/latest", &QueryParams::new())
            .await
    }

    pub async fn transfers(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query("token.transfers", address, "transfers", params).await
    }

    pub async fn velocity(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query("token.velocity", address, "velocity", params).await
    }

    pub async fn volume(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query("token.volume", address, "volume", params).await
    }
}
