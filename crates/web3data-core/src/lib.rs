//! web3data-core: foundation types shared by the web3data crates.
//!
//! # Overview
//!
//! - [`Chain`]: the chains served by the API, their blockchain ids and the
//!   capability table that gates operations per chain
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`]: JSON-RPC 2.0 wire types
//! - [`ClientConfig`]: endpoint URLs, API key and timeouts
//! - [`Error`]: REST and RPC error type

pub mod chain;
pub mod config;
pub mod error;
pub mod request;

pub use chain::Chain;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use request::{is_truthy, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId, RpcParam};
