//! web3data-ws: WebSocket subscriptions over JSON-RPC 2.0.
//!
//! # Features
//! - Many logical subscriptions multiplexed over a single connection
//! - Acknowledgement correlation through client-generated request ids
//! - Push routing from server-assigned subscription ids to user callbacks
//! - Deferred subscribe: registrations are flushed once the socket opens
//! - Optional reconnect with exponential backoff and subscription replay
//!
//! [`SubscriptionManager`] is the transport-agnostic state machine;
//! [`WebsocketClient`] drives it over a `tokio-tungstenite` connection.

pub mod client;
pub mod error;
pub mod subscriptions;
pub mod transport;

pub use client::{WebsocketClient, WsClientConfig, WsHandle};
pub use error::WsError;
pub use subscriptions::{
    Callback, ConnectionContext, ConnectionState, Dispatched, SubscriptionId,
    SubscriptionManager, Topics,
};
pub use transport::{Outbox, Transport};
