//! web3data-http: REST surface of the web3data API.
//!
//! # Features
//! - [`RestClient::query`]: GET with the API headers, body classified as
//!   JSON, CSV text, empty or unparseable
//! - Resource handlers for addresses, blocks, contracts, market data,
//!   signatures, tokens and transactions
//! - Chain gating: account-model endpoints fail fast on UTXO chains
//! - [`RestClient::rpc`]: JSON-RPC 2.0 over HTTP POST

pub mod client;
pub mod handlers;
pub mod params;

pub use client::{classify_body, join_url, ApiResponse, RestClient};
pub use handlers::{
    AddressHandler, BlockHandler, ContractHandler, MarketHandler, SignatureHandler, TokenHandler,
    TransactionHandler,
};
pub use params::QueryParams;
