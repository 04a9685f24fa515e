//! Error types for REST and RPC calls.

use thiserror::Error;

use crate::chain::Chain;
use crate::request::JsonRpcError;

/// Convenience alias used across the REST surface.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while querying the REST or RPC endpoints.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed (connection refused, timeout, non-UTF-8 body, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The API returned data that could not be interpreted.
    #[error("API error: {0}")]
    Api(String),

    /// The response body was empty or held an empty JSON value.
    #[error("The API returned an empty JSON response")]
    EmptyResponse,

    /// The operation is not available on the handler's chain.
    #[error("{operation} is not supported for {chain}")]
    UnsupportedChain {
        chain: Chain,
        operation: &'static str,
    },

    /// A chain name that is not in the chain table.
    #[error("unknown chain: {0}")]
    UnknownChain(String),

    /// A base URL or route could not be turned into a request URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// A JSON value could not be (de)serialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` for empty-body responses.
    pub fn is_empty_response(&self) -> bool {
        matches!(self, Self::EmptyResponse)
    }

    /// Returns `true` if the call was refused by chain gating, before any request was made.
    pub fn is_unsupported_chain(&self) -> bool {
        matches!(self, Self::UnsupportedChain { .. })
    }
}
