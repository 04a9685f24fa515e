//! Per-chain API handler.

use serde_json::Value;

use web3data_core::{Chain, ClientConfig, JsonRpcResponse, Result, RpcId};
use web3data_http::{
    AddressHandler, BlockHandler, ContractHandler, MarketHandler, RestClient, SignatureHandler,
    TokenHandler, TransactionHandler,
};
use web3data_ws::{WebsocketClient, WsClientConfig};

/// Entry point for every API surface of one chain.
#[derive(Debug, Clone)]
pub struct ApiHandler {
    chain: Chain,
    rest: RestClient,
    ws_url: String,
    api_key: String,
}

impl ApiHandler {
    pub fn new(config: &ClientConfig, chain: Chain) -> Result<Self> {
        Ok(Self {
            chain,
            rest: RestClient::new(config, chain)?,
            ws_url: config.ws_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn blockchain_id(&self) -> &'static str {
        self.chain.blockchain_id()
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn address(&self) -> AddressHandler<'_> {
        AddressHandler::new(&self.rest)
    }

    pub fn block(&self) -> BlockHandler<'_> {
        BlockHandler::new(&self.rest)
    }

    pub fn contract(&self) -> ContractHandler<'_> {
        ContractHandler::new(&self.rest)
    }

    pub fn market(&self) -> MarketHandler<'_> {
        MarketHandler::new(&self.rest)
    }

    pub fn signature(&self) -> SignatureHandler<'_> {
        SignatureHandler::new(&self.rest)
    }

    pub fn token(&self) -> TokenHandler<'_> {
        TokenHandler::new(&self.rest)
    }

    pub fn transaction(&self) -> TransactionHandler<'_> {
        TransactionHandler::new(&self.rest)
    }

    /// WebSocket configuration for this chain; adjust reconnect settings
    /// before passing it to [`WebsocketClient::new`].
    pub fn websocket_config(&self) -> WsClientConfig {
        WsClientConfig::new(self.api_key.clone(), self.chain.blockchain_id()).with_url(self.ws_url.clone())
    }

    /// A subscription client for this chain's event streams.
    pub fn websocket(&self) -> WebsocketClient {
        WebsocketClient::new(self.websocket_config())
    }

    /// JSON-RPC call over HTTP. Available on ETH, ETH_RINKEBY and BTC.
    pub async fn rpc(&self, method: &str, params: Vec<Value>, id: impl Into<RpcId>) -> Result<JsonRpcResponse> {
        self.rest.rpc(method, params, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn websocket_config_carries_chain_headers() {
        let mut config = ClientConfig::new("key");
        config.ws_url = "ws://127.0.0.1:1234/".into();
        let handler = ApiHandler::new(&config, Chain::EthRinkeby).unwrap();

        let ws = handler.websocket_config();
        assert_eq!(ws.url, "ws://127.0.0.1:1234/");
        assert_eq!(ws.api_key, "key");
        assert_eq!(ws.blockchain_id, "1b3f7a72b3e99c13");
        assert!(!ws.reconnect);
        assert_eq!(handler.websocket().url(), "ws://127.0.0.1:1234/");
    }

    #[tokio::test]
    async fn rpc_gating() {
        let handler = ApiHandler::new(&ClientConfig::new("key"), Chain::Bch).unwrap();
        let err = handler.rpc("getblockcount", vec![], 1).await.unwrap_err();
        assert!(err.is_unsupported_chain());
    }
}
