//! Async WebSocket driver for the subscription manager.

use std::time::Duration;

use futures::{Sink, SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use web3data_core::config::DEFAULT_WS_URL;
use web3data_core::RpcId;

use crate::error::WsError;
use crate::subscriptions::{
    Callback, ConnectionContext, SubscriptionId, SubscriptionManager, Topics,
};
use crate::transport::Outbox;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Lower bound for the reconnect delay.
const MIN_RECONNECT_BACKOFF: Duration = Duration::from_millis(10);

/// Configuration for the WebSocket client.
#[derive(Debug, Clone)]
pub struct WsClientConfig {
    /// Endpoint URL.
    pub url: String,
    /// Sent as `x-api-key` in the opening handshake.
    pub api_key: String,
    /// Sent as `x-amberdata-blockchain-id` in the opening handshake.
    pub blockchain_id: String,
    /// Reconnect after the connection drops instead of returning from `run`.
    pub reconnect: bool,
    /// Reconnect backoff starting duration.
    pub reconnect_initial: Duration,
    /// Maximum reconnect backoff.
    pub reconnect_max: Duration,
}

impl Default for WsClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_URL.into(),
            api_key: String::new(),
            blockchain_id: String::new(),
            reconnect: false,
            reconnect_initial: Duration::from_millis(500),
            reconnect_max: Duration::from_secs(60),
        }
    }
}

impl WsClientConfig {
    pub fn new(api_key: impl Into<String>, blockchain_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            blockchain_id: blockchain_id.into(),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_reconnect(mut self, reconnect: bool) -> Self {
        self.reconnect = reconnect;
        self
    }
}

/// Command sent from handles to the running client.
enum WsCommand {
    Register {
        topics: Topics,
        callback: Callback,
        tx: oneshot::Sender<Result<RpcId, WsError>>,
    },
    Unregister {
        subscription: SubscriptionId,
        tx: oneshot::Sender<Result<RpcId, WsError>>,
    },
    Close,
}

/// Cloneable handle for talking to a [`WebsocketClient`] while it runs.
#[derive(Clone)]
pub struct WsHandle {
    cmd_tx: mpsc::UnboundedSender<WsCommand>,
}

impl WsHandle {
    /// Register a subscription on the running client.
    pub async fn register<F>(&self, topics: impl Into<Topics>, callback: F) -> Result<RpcId, WsError>
    where
        F: FnMut(&mut ConnectionContext, &Value) -> anyhow::Result<()> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.send(WsCommand::Register {
            topics: topics.into(),
            callback: Box::new(callback),
            tx,
        })?;
        rx.await.map_err(|_| WsError::ClientClosed)?
    }

    /// Unsubscribe from a confirmed subscription.
    pub async fn unregister(&self, subscription: impl Into<SubscriptionId>) -> Result<RpcId, WsError> {
        let (tx, rx) = oneshot::channel();
        self.send(WsCommand::Unregister {
            subscription: subscription.into(),
            tx,
        })?;
        rx.await.map_err(|_| WsError::ClientClosed)?
    }

    /// Ask the client to close the connection and return from `run`.
    pub fn close(&self) -> Result<(), WsError> {
        self.send(WsCommand::Close)
    }

    fn send(&self, cmd: WsCommand) -> Result<(), WsError> {
        self.cmd_tx.send(cmd).map_err(|_| WsError::ClientClosed)
    }
}

/// How a connection ended.
enum Outcome {
    /// Closed on request; `run` returns.
    Finished,
    /// Lost; reconnect if configured.
    Dropped,
}

/// WebSocket subscription client.
///
/// Owns a [`SubscriptionManager`] and, inside [`run`](Self::run), the
/// physical connection. Subscriptions registered before `run` are sent once
/// the socket opens.
pub struct WebsocketClient {
    config: WsClientConfig,
    manager: SubscriptionManager<Outbox>,
    cmd_tx: mpsc::UnboundedSender<WsCommand>,
    cmd_rx: mpsc::UnboundedReceiver<WsCommand>,
}

impl WebsocketClient {
    pub fn new(config: WsClientConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let manager = SubscriptionManager::new(Outbox::new(), config.url.clone());
        Self {
            config,
            manager,
            cmd_tx,
            cmd_rx,
        }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn config(&self) -> &WsClientConfig {
        &self.config
    }

    /// Handle for registering, unregistering and closing while `run` is active.
    pub fn handle(&self) -> WsHandle {
        WsHandle {
            cmd_tx: self.cmd_tx.clone(),
        }
    }

    pub fn manager(&self) -> &SubscriptionManager<Outbox> {
        &self.manager
    }

    /// See [`SubscriptionManager::register`].
    pub fn register<F>(&mut self, topics: impl Into<Topics>, callback: F) -> Result<RpcId, WsError>
    where
        F: FnMut(&mut ConnectionContext, &Value) -> anyhow::Result<()> + Send + 'static,
    {
        self.manager.register(topics, callback)
    }

    pub fn register_silent(&mut self, topics: impl Into<Topics>) -> Result<RpcId, WsError> {
        self.manager.register_silent(topics)
    }

    pub fn on_open(&mut self, hook: impl FnMut(&mut ConnectionContext) + Send + 'static) -> &mut Self {
        self.manager.set_on_open(hook);
        self
    }

    pub fn on_close(&mut self, hook: impl FnMut(&mut ConnectionContext) + Send + 'static) -> &mut Self {
        self.manager.set_on_close(hook);
        self
    }

    pub fn on_error(
        &mut self,
        hook: impl FnMut(&mut ConnectionContext, &WsError) + Send + 'static,
    ) -> &mut Self {
        self.manager.set_on_error(hook);
        self
    }

    /// Connect and process frames until the connection closes, a callback or
    /// hook calls [`ConnectionContext::close`], or a handle sends close.
    ///
    /// With `reconnect` enabled a lost connection is re-established with
    /// exponential backoff and every registered subscription is sent again.
    pub async fn run(&mut self) -> Result<(), WsError> {
        let initial = self.config.reconnect_initial.max(MIN_RECONNECT_BACKOFF);
        let mut backoff = initial;

        loop {
            tracing::info!(url = %self.config.url, "connecting via WebSocket");

            match connect(&self.config).await {
                Ok(stream) => {
                    backoff = initial;
                    if let Outcome::Finished = self.drive(stream).await? {
                        return Ok(());
                    }
                }
                Err(e) => {
                    if !self.config.reconnect {
                        return Err(e);
                    }
                    tracing::warn!(error = %e, "WS connect failed");
                    self.manager.handle_error(&e);
                }
            }

            if !self.config.reconnect {
                return Ok(());
            }

            tracing::warn!(url = %self.config.url, "WS disconnected, reconnecting in {backoff:?}");
            if self.wait(backoff).await {
                return Ok(());
            }
            backoff = next_backoff(backoff, self.config.reconnect_max);
        }
    }

    /// Run one connection to completion.
    async fn drive(&mut self, stream: WsStream) -> Result<Outcome, WsError> {
        let (mut sink, mut stream) = stream.split();

        let flushed = match self.manager.handle_open() {
            Ok(n) => n,
            Err(e) => {
                let _ = sink.send(Message::Close(None)).await;
                self.manager.handle_close();
                return Err(e);
            }
        };
        tracing::info!(url = %self.config.url, flushed, "WebSocket connected");

        let outcome = loop {
            if let Err(e) = send_queued(&mut self.manager, &mut sink).await {
                tracing::warn!(error = %e, "WS send error");
                self.manager.handle_error(&e);
                break Outcome::Dropped;
            }
            if self.manager.context().close_requested() {
                break Outcome::Finished;
            }

            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    if self.apply(cmd) {
                        break Outcome::Finished;
                    }
                }
                frame = stream.next() => {
                    match frame {
                        None => break Outcome::Dropped,
                        Some(Err(e)) => {
                            let e = WsError::WebSocket(e.to_string());
                            tracing::warn!(error = %e, "WS receive error");
                            self.manager.handle_error(&e);
                            break Outcome::Dropped;
                        }
                        Some(Ok(Message::Text(text))) => self.dispatch(text.as_str()),
                        Some(Ok(Message::Close(frame))) => {
                            tracing::debug!(?frame, "server closed the connection");
                            break Outcome::Dropped;
                        }
                        Some(Ok(_)) => {}
                    }
                }
            }
        };

        if let Outcome::Finished = outcome {
            let _ = sink.send(Message::Close(None)).await;
            let _ = sink.close().await;
        }
        self.manager.handle_close();
        tracing::info!(url = %self.config.url, "WebSocket closed");
        Ok(outcome)
    }

    fn dispatch(&mut self, text: &str) {
        match self.manager.handle_message(text) {
            Ok(dispatched) => tracing::trace!(?dispatched, "frame dispatched"),
            Err(e) => {
                if e.is_protocol_error() {
                    tracing::warn!(error = %e, "ignoring bad WebSocket message");
                } else {
                    tracing::error!(error = %e, "failed to handle WebSocket message");
                }
                self.manager.handle_error(&e);
            }
        }
    }

    /// Apply a handle command. Returns `true` when the client should close.
    fn apply(&mut self, cmd: Option<WsCommand>) -> bool {
        match cmd {
            None | Some(WsCommand::Close) => true,
            Some(WsCommand::Register {
                topics,
                callback,
                tx,
            }) => {
                let _ = tx.send(self.manager.register_boxed(topics, callback));
                false
            }
            Some(WsCommand::Unregister { subscription, tx }) => {
                let _ = tx.send(self.manager.unregister(&subscription));
                false
            }
        }
    }

    /// Sleep out a reconnect backoff while still serving handle commands.
    /// Returns `true` if a close was requested meanwhile.
    async fn wait(&mut self, delay: Duration) -> bool {
        let sleep = time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return false,
                cmd = self.cmd_rx.recv() => {
                    if self.apply(cmd) {
                        return true;
                    }
                }
            }
        }
    }
}

/// Open the socket with the handshake headers.
async fn connect(config: &WsClientConfig) -> Result<WsStream, WsError> {
    let mut request = config
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| WsError::WebSocket(e.to_string()))?;

    let headers = request.headers_mut();
    headers.insert("x-api-key", header_value("x-api-key", &config.api_key)?);
    headers.insert(
        "x-amberdata-blockchain-id",
        header_value("x-amberdata-blockchain-id", &config.blockchain_id)?,
    );

    let (stream, _) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| WsError::WebSocket(e.to_string()))?;
    Ok(stream)
}

/// Double `current`, capped at `max` and never below the floor.
fn next_backoff(current: Duration, max: Duration) -> Duration {
    current
        .saturating_mul(2)
        .min(max)
        .max(MIN_RECONNECT_BACKOFF)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, WsError> {
    HeaderValue::from_str(value).map_err(|e| WsError::WebSocket(format!("invalid {name} header: {e}")))
}

/// Write every frame the manager queued, oldest first.
async fn send_queued<S>(manager: &mut SubscriptionManager<Outbox>, sink: &mut S) -> Result<(), WsError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    for frame in manager.transport_mut().drain() {
        sink.send(Message::Text(frame.into()))
            .await
            .map_err(|e| WsError::WebSocket(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = WsClientConfig::new("key", "1c9c969065fcd1cf");
        assert_eq!(config.url, "wss://ws.web3api.io/");
        assert!(!config.reconnect);
        assert_eq!(config.reconnect_initial, Duration::from_millis(500));
        assert_eq!(config.reconnect_max, Duration::from_secs(60));
    }

    #[test]
    fn registrations_before_run_are_deferred() {
        let mut client = WebsocketClient::new(WsClientConfig::default());
        let id = client.register_silent("block").unwrap();
        assert!(client.manager().is_pending(&id));
        assert!(client.manager().transport().is_empty());
    }

    #[tokio::test]
    async fn handle_fails_once_client_is_dropped() {
        let client = WebsocketClient::new(WsClientConfig::default());
        let handle = client.handle();
        drop(client);
        assert!(matches!(handle.close(), Err(WsError::ClientClosed)));
        assert!(matches!(
            handle.unregister("sub-1").await,
            Err(WsError::ClientClosed)
        ));
    }

    fn assert_send<T: Send>(_: T) {}

    #[test]
    fn run_future_is_send() {
        let mut client = WebsocketClient::new(WsClientConfig::default());
        assert_send(client.run());
    }

    #[test]
    fn backoff_doubles_up_to_max() {
        let max = Duration::from_secs(60);
        assert_eq!(next_backoff(Duration::from_millis(500), max), Duration::from_secs(1));
        assert_eq!(next_backoff(Duration::from_secs(40), max), max);
        assert_eq!(next_backoff(Duration::MAX, max), max);
    }

    #[test]
    fn zero_backoff_is_raised_to_floor() {
        let max = Duration::from_secs(60);
        assert_eq!(next_backoff(Duration::ZERO, max), MIN_RECONNECT_BACKOFF);
        assert_eq!(next_backoff(Duration::ZERO, Duration::ZERO), MIN_RECONNECT_BACKOFF);
    }

    #[test]
    fn invalid_header_is_rejected() {
        assert!(header_value("x-api-key", "bad\nvalue").is_err());
    }
}
