//! Top-level client.

use web3data_core::{Chain, ClientConfig, Result};

use crate::handler::ApiHandler;

/// The web3data API client: one [`ApiHandler`] per supported chain.
#[derive(Debug, Clone)]
pub struct Web3Data {
    pub btc: ApiHandler,
    pub bch: ApiHandler,
    pub bsv: ApiHandler,
    pub eth: ApiHandler,
    pub eth_rinkeby: ApiHandler,
    pub ltc: ApiHandler,
    pub zec: ApiHandler,
}

impl Web3Data {
    /// Client with default endpoints.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(ClientConfig::new(api_key))
    }

    /// Client configured from `AMBERDATA_API_KEY` and the `WEB3DATA_*_URL` overrides.
    pub fn from_env() -> Result<Self> {
        Self::with_config(ClientConfig::from_env())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        tracing::debug!(rest = %config.rest_base_url, ws = %config.ws_url, "building web3data client");
        Ok(Self {
            btc: ApiHandler::new(&config, Chain::Btc)?,
            bch: ApiHandler::new(&config, Chain::Bch)?,
            bsv: ApiHandler::new(&config, Chain::Bsv)?,
            eth: ApiHandler::new(&config, Chain::Eth)?,
            eth_rinkeby: ApiHandler::new(&config, Chain::EthRinkeby)?,
            ltc: ApiHandler::new(&config, Chain::Ltc)?,
            zec: ApiHandler::new(&config, Chain::Zec)?,
        })
    }

    /// Handler for `chain`.
    pub fn chain(&self, chain: Chain) -> &ApiHandler {
        match chain {
            Chain::Btc => &self.btc,
            Chain::Bch => &self.bch,
            Chain::Bsv => &self.bsv,
            Chain::Eth => &self.eth,
            Chain::EthRinkeby => &self.eth_rinkeby,
            Chain::Ltc => &self.ltc,
            Chain::Zec => &self.zec,
        }
    }
}
