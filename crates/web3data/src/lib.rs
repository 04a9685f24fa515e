//! web3data: client for the web3data blockchain API.
//!
//! # Quick start
//! ```rust,no_run
//! use web3data::{QueryParams, Web3Data};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let w3d = Web3Data::new("YOUR_API_KEY")?;
//! let block = w3d.eth.block().single("latest", &QueryParams::new()).await?;
//! println!("{block:?}");
//!
//! let mut ws = w3d.eth.websocket();
//! ws.register("block", |ctx, msg| {
//!     println!("{}", msg["params"]["result"]);
//!     ctx.close();
//!     Ok(())
//! })?;
//! ws.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod handler;

pub use client::Web3Data;
pub use handler::ApiHandler;

pub use web3data_core::{Chain, ClientConfig, Error, JsonRpcResponse, Result, RpcId};
pub use web3data_http::{ApiResponse, QueryParams, RestClient};
pub use web3data_ws::{
    ConnectionContext, SubscriptionId, Topics, WebsocketClient, WsClientConfig, WsError, WsHandle,
};
