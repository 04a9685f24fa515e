//! Address endpoints (`addresses/{hash}/...`).

use web3data_core::Result;

use crate::client::{ApiResponse, RestClient};
use crate::params::QueryParams;

/// Queries about accounts and their balances, transfers and activity.
#[derive(Debug, Clone, Copy)]
pub struct AddressHandler<'a> {
    client: &'a RestClient,
}

impl<'a> AddressHandler<'a> {
    pub fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    async fn query(&self, address: &str, route: &str, params: &QueryParams) -> Result<ApiResponse> {
        let base = if address.is_empty() {
            self.client.resource("addresses/")
        } else {
            self.client.resource(&format!("addresses/{address}/"))
        };
        self.client.query(&base, route, params).await
    }

    /// Every address seen on the network. Filters: `hash`, `blockNumber*`,
    /// `startDate`, `endDate`, `type`, `transactionHash`, `page`, `size`.
    pub async fn total(&self, params: &QueryParams) -> Result<ApiResponse> {
        self.query("", "", params).await
    }

    /// Historical adoption (`timeFormat`, `timeFrame`, `timePeriod`).
    pub async fn adoption(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(address, "adoption", params).await
    }

    /// Time series of account balances.
    pub async fn balance_historical(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(address, "account-balances/historical", params).await
    }

    pub async fn balance_latest(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(address, "account-balances/latest", params).await
    }

    /// Latest account and token balances for several addresses in one call.
    pub async fn balances_batch(&self, addresses: &[&str], params: &QueryParams) -> Result<ApiResponse> {
        let params = params.clone().with("addresses", addresses.join(","));
        self.query("", "balances", &params).await
    }

    /// Latest account and token balances.
    pub async fn balances(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(address, "balances", params).await
    }

    /// Networks and blockchains the address exists on.
    pub async fn information(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(address, "information", params).await
    }

    /// Internal messages the address originated or received.
    pub async fn internal_messages(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.client.ensure_supported("address.internal_messages")?;
        self.query(address, "functions", params).await
    }

    pub async fn logs(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.client.ensure_supported("address.logs")?;
        self.query(address, "logs", params).await
    }

    pub async fn metadata(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(address, "metadata", params).await
    }

    pub async fn pending_transactions(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(address, "pending-transactions", params).await
    }

    /// Time series of token balances.
    pub async fn token_balances_historical(
        &self,
        address: &str,
        params: &QueryParams,
    ) -> Result<ApiResponse> {
        self.client.ensure_supported("address.token_balances_historical")?;
        self.query(address, "token-balances", params).await
    }

    /// Tokens the address currently holds.
    pub async fn token_balances_latest(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.client.ensure_supported("address.token_balances_latest")?;
        self.query(address, "tokens", params).await
    }

    pub async fn token_transfers(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.client.ensure_supported("address.token_transfers")?;
        self.query(address, "token-transfers", params).await
    }

    pub async fn transactions(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(address, "transactions", params).await
    }

    pub async fn usage(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(address, "usage", params).await
    }

    /// Network-wide address metrics.
    pub async fn metrics(&self) -> Result<ApiResponse> {
        self.query("", "metrics/latest", &QueryParams::new()).await
    }
}
