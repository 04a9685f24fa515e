//! WebSocket subscription errors.

use serde_json::Value;
use thiserror::Error;

use web3data_core::{JsonRpcError, RpcId};

use crate::subscriptions::SubscriptionId;

/// Errors raised by the subscription manager and the WebSocket driver.
#[derive(Debug, Error)]
pub enum WsError {
    /// Inbound text frame is not valid JSON.
    #[error("malformed frame: {0}")]
    MalformedFrame(#[source] serde_json::Error),

    /// Valid JSON that is neither a push, an acknowledgement nor an error response.
    #[error("received unknown message: {0}")]
    UnknownMessage(Value),

    /// No local request is mapped to this server-assigned subscription id.
    #[error("unknown subscription id: {0}")]
    UnknownSubscription(SubscriptionId),

    /// Acknowledgement for a request id that is not awaiting one.
    #[error("acknowledgement for request {0} that is not pending")]
    UnexpectedAck(RpcId),

    /// The server answered a request with a JSON-RPC error object.
    #[error("request {id} rejected: {error}")]
    Rejected { id: RpcId, error: JsonRpcError },

    /// The manager's own bookkeeping is inconsistent.
    #[error("internal consistency error: {0}")]
    Internal(String),

    /// A subscription callback returned an error.
    #[error("subscription callback failed: {0}")]
    Callback(#[source] anyhow::Error),

    /// The operation needs an open connection.
    #[error("WebSocket is not connected")]
    NotConnected,

    /// Connect/send/receive failure on the socket.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// An outbound payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The client task is gone; commands can no longer be delivered.
    #[error("WebSocket client closed")]
    ClientClosed,
}

impl WsError {
    /// Errors that describe a bad inbound message rather than a local failure.
    ///
    /// The driver logs these at `warn` and other dispatch failures, such as a
    /// failing callback, at `error`. Both go to `on_error` and the connection
    /// stays open.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedFrame(_)
                | Self::UnknownMessage(_)
                | Self::UnknownSubscription(_)
                | Self::UnexpectedAck(_)
                | Self::Rejected { .. }
        )
    }
}
