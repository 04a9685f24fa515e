//! Block endpoints (`blocks/{id}/...`).

use web3data_core::Result;

use crate::client::{ApiResponse, RestClient};
use crate::params::QueryParams;

#[derive(Debug, Clone, Copy)]
pub struct BlockHandler<'a> {
    client: &'a RestClient,
}

impl<'a> BlockHandler<'a> {
    pub fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    async fn query(&self, block_id: &str, route: &str, params: &QueryParams) -> Result<ApiResponse> {
        let base = if block_id.is_empty() {
            self.client.resource("blocks/")
        } else {
            self.client.resource(&format!("blocks/{block_id}/"))
        };
        self.client.query(&base, route, params).await
    }

    /// A single block by number or hash.
    pub async fn single(&self, block_id: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(block_id, "", params).await
    }

    /// Every block, paginated.
    pub async fn total(&self, params: &QueryParams) -> Result<ApiResponse> {
        self.query("", "", params).await
    }

    pub async fn functions(&self, block_id: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.client.ensure_supported("block.functions")?;
        self.query(block_id, "functions", params).await
    }

    pub async fn logs(&self, block_id: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.client.ensure_supported("block.logs")?;
        self.query(block_id, "logs", params).await
    }

    pub async fn token_transfers(&self, block_id: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.client.ensure_supported("block.token_transfers")?;
        self.query(block_id, "token-transfers", params).await
    }

    pub async fn transactions(&self, block_id: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(block_id, "transactions", params).await
    }

    pub async fn metrics_latest(&self, params: &QueryParams) -> Result<ApiResponse> {
        self.query("", "metrics/latest", params).await
    }

    pub async fn metrics_historical(&self, params: &QueryParams) -> Result<ApiResponse> {
        self.query("", "metrics/historical", params).await
    }
}
