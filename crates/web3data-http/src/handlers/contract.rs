//! Contract endpoints (`contracts/{hash}/...`). Gated on limited chains.

use web3data_core::Result;

use crate::client::{ApiResponse, RestClient};
use crate::params::QueryParams;

#[derive(Debug, Clone, Copy)]
pub struct ContractHandler<'a> {
    client: &'a RestClient,
}

impl<'a> ContractHandler<'a> {
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
        let base = self.client.resource(&format!("contracts/{address}/"));
        self.client.query(&base, route, params).await
    }

    /// Security audit results for the contract.
    pub async fn audit(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query("contract.audit", address, "audit", params).await
    }

    /// Source, ABI and bytecode details.
    pub async fn details(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query("contract.details", address, "", params).await
    }

    pub async fn functions(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query("contract.functions", address, "functions", params).await
    }
}
