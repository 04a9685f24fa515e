//! Market data endpoints (`market/...`, `tokens/rankings...`).
//!
//! Routes resolve against the REST base URL directly; `pair` is a trading
//! pair such as `eth_usd` and `base` an asset symbol such as `eth`.

use web3data_core::Result;

use crate::client::{ApiResponse, RestClient};
use crate::params::QueryParams;

#[derive(Debug, Clone, Copy)]
pub struct MarketHandler<'a> {
    client: &'a RestClient,
}

impl<'a> MarketHandler<'a> {
    pub fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    async fn query(&self, route: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.client.query(self.client.base_url(), route, params).await
    }

    /// Supported exchanges and the pairs they list.
    pub async fn exchanges(&self, params: &QueryParams) -> Result<ApiResponse> {
        self.query("market/exchanges", params).await
    }

    pub async fn ohlcv(&self, params: &QueryParams) -> Result<ApiResponse> {
        self.query("market/ohlcv/information", params).await
    }

    pub async fn pairs(&self, params: &QueryParams) -> Result<ApiResponse> {
        self.query("market/pairs", params).await
    }

    /// Assets ranked by market cap, volume or price change.
    pub async fn rankings(&self, params: &QueryParams) -> Result<ApiResponse> {
        self.query("market/rankings", params).await
    }

    pub async fn price_pairs(&self) -> Result<ApiResponse> {
        self.query("market/prices/pairs", &QueryParams::new()).await
    }

    pub async fn ticker_pairs(&self, params: &QueryParams) -> Result<ApiResponse> {
        self.query("market/tickers/information", params).await
    }

    pub async fn trades(&self, params: &QueryParams) -> Result<ApiResponse> {
        self.query("market/trades/information", params).await
    }

    /// Historical best bid and offer.
    pub async fn order_best_bid_historical(&self, pair: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(&format!("market/orders/{pair}/bbo/historical"), params)
            .await
    }

    pub async fn order_best_bid_latest(&self, pair: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(&format!("market/orders/{pair}/bbo"), params).await
    }

    pub async fn order_book_updates(&self, pair: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(&format!("market/orders/{pair}/update"), params).await
    }

    /// Order book snapshot.
    pub async fn order_book(&self, pair: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(&format!("market/orders/{pair}"), params).await
    }

    pub async fn uniswap_liquidity(&self, pair: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(&format!("market/orders/uniswap/{pair}/liquidity"), params)
            .await
    }

    pub async fn trade_pairs_historical(&self, pair: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(&format!("market/trades/{pair}/historical"), params)
            .await
    }

    pub async fn ohlcv_pair_latest(&self, pair: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(&format!("market/ohlcv/{pair}/latest"), params).await
    }

    pub async fn ohlcv_pair_historical(&self, pair: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(&format!("market/ohlcv/{pair}/historical"), params)
            .await
    }

    pub async fn price_pair_historical(&self, pair: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(&format!("market/spot/prices/pairs/{pair}/historical"), params)
            .await
    }

    pub async fn price_pair_latest(&self, pair: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(&format!("market/spot/prices/pairs/{pair}/latest"), params)
            .await
    }

    /// Volume-weighted average price of `base` across its pairs.
    pub async fn base_wap_latest(&self, base: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(&format!("market/prices/{base}/wap/latest"), params)
            .await
    }

    pub async fn ticker_bid_ask_latest(&self, pair: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(&format!("market/tickers/{pair}/latest"), params).await
    }

    pub async fn ticker_bid_ask_historical(&self, pair: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(&format!("market/tickers/{pair}/historical"), params)
            .await
    }

    pub async fn token_price_historical(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(&format!("market/tokens/prices/{address}/historical"), params)
            .await
    }

    pub async fn token_price_latest(&self, address: &str, params: &QueryParams) -> Result<ApiResponse> {
        self.query(&format!("market/tokens/prices/{address}/latest"), params)
            .await
    }

    pub async fn token_rankings_historical(&self, params: &QueryParams) -> Result<ApiResponse> {
        self.client.ensure_supported("market.token_rankings_historical")?;
        self.query("tokens/rankings/historical", params).await
    }

    pub async fn token_rankings_latest(&self, params: &QueryParams) -> Result<ApiResponse> {
        self.client.ensure_supported("market.token_rankings_latest")?;
        self.query("tokens/rankings", params).await
    }
}
