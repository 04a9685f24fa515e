//! WebSocket subscription management.
//!
//! Every `subscribe`/`unsubscribe` request is tagged with a fresh local
//! request id. The server acknowledges a subscribe with its own subscription
//! id and from then on tags pushes with that id only, so the manager keeps
//! both namespaces: the subscription table (request id -> payload and
//! callback), the pending set (request ids awaiting an acknowledgement) and
//! the external map (subscription id -> request id).
//!
//! The manager is synchronous and does no locking. The owner must call the
//! `handle_*` methods from one logical stream of control, as
//! [`crate::WebsocketClient`] does.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use web3data_core::{is_truthy, JsonRpcError, JsonRpcRequest, RpcId};

use crate::error::WsError;
use crate::transport::Transport;

const SUBSCRIBE: &str = "subscribe";
const UNSUBSCRIBE: &str = "unsubscribe";

/// A subscription ID assigned by the server in a subscribe acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub String);

impl From<String> for SubscriptionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SubscriptionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters of one subscribe request: one or more topic names, optionally
/// followed by filter objects (e.g. `["address:logs", {"address": "0x…"}]`).
#[derive(Debug, Clone, PartialEq)]
pub struct Topics(Vec<Value>);

impl Topics {
    pub fn new(topic: impl Into<String>) -> Self {
        Self(vec![Value::String(topic.into())])
    }

    /// Append another topic to the same request.
    pub fn and(mut self, topic: impl Into<String>) -> Self {
        self.0.push(Value::String(topic.into()));
        self
    }

    /// Append a filter object.
    pub fn with_filter(mut self, filter: Value) -> Self {
        self.0.push(filter);
        self
    }

    pub fn as_params(&self) -> &[Value] {
        &self.0
    }

    pub fn into_params(self) -> Vec<Value> {
        self.0
    }
}

impl From<&str> for Topics {
    fn from(topic: &str) -> Self {
        Self::new(topic)
    }
}

impl From<String> for Topics {
    fn from(topic: String) -> Self {
        Self::new(topic)
    }
}

impl From<&[&str]> for Topics {
    fn from(topics: &[&str]) -> Self {
        Self(topics.iter().map(|t| Value::String((*t).to_string())).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Topics {
    fn from(topics: [&str; N]) -> Self {
        Self::from(&topics[..])
    }
}

impl From<Vec<&str>> for Topics {
    fn from(topics: Vec<&str>) -> Self {
        Self::from(topics.as_slice())
    }
}

impl From<Vec<String>> for Topics {
    fn from(topics: Vec<String>) -> Self {
        Self(topics.into_iter().map(Value::String).collect())
    }
}

impl From<Vec<Value>> for Topics {
    fn from(params: Vec<Value>) -> Self {
        Self(params)
    }
}

/// Handle to the connection passed to callbacks and lifecycle hooks.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    url: String,
    close_requested: bool,
}

impl ConnectionContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            close_requested: false,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Ask the driver to close the connection once the current handler returns.
    pub fn close(&mut self) {
        self.close_requested = true;
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }
}

/// User callback for push messages on one subscription.
pub type Callback = Box<dyn FnMut(&mut ConnectionContext, &Value) -> anyhow::Result<()> + Send>;

type LifecycleHook = Box<dyn FnMut(&mut ConnectionContext) + Send>;
type ErrorHook = Box<dyn FnMut(&mut ConnectionContext, &WsError) + Send>;

/// Connection lifecycle as observed by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed, never connected.
    Idle,
    /// Transport connected; new registrations are sent immediately.
    Open,
    /// Transport closed; registrations are deferred to the next open.
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// What [`SubscriptionManager::handle_message`] did with a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// A push was routed to the callback of this subscription.
    Data { subscription: SubscriptionId },
    /// A subscribe request was confirmed.
    Subscribed { id: RpcId, subscription: SubscriptionId },
    /// An unsubscribe request was confirmed.
    Unsubscribed { id: RpcId },
}

struct SubscriptionEntry {
    request: JsonRpcRequest,
    /// `request` serialized once at registration; replayed verbatim.
    frame: String,
    callback: Callback,
}

/// Multiplexes subscriptions over one connection and routes pushes to callbacks.
pub struct SubscriptionManager<T: Transport> {
    transport: T,
    context: ConnectionContext,
    state: ConnectionState,
    pending: HashSet<RpcId>,
    entries: HashMap<RpcId, SubscriptionEntry>,
    external: HashMap<SubscriptionId, RpcId>,
    on_open: LifecycleHook,
    on_close: LifecycleHook,
    on_error: ErrorHook,
}

impl<T: Transport> SubscriptionManager<T> {
    pub fn new(transport: T, url: impl Into<String>) -> Self {
        Self {
            transport,
            context: ConnectionContext::new(url),
            state: ConnectionState::Idle,
            pending: HashSet::new(),
            entries: HashMap::new(),
            external: HashMap::new(),
            on_open: Box::new(|_| {}),
            on_close: Box::new(|_| {}),
            on_error: Box::new(|_, _| {}),
        }
    }

    fn next_id() -> RpcId {
        RpcId::String(Uuid::new_v4().to_string())
    }

    /// Register interest in `topics`; `callback` receives every push for the
    /// resulting subscription.
    ///
    /// The request is sent right away when the connection is open and
    /// otherwise on the next [`handle_open`](Self::handle_open). Returns the
    /// request id; the server's subscription id arrives later in the
    /// acknowledgement.
    pub fn register<F>(&mut self, topics: impl Into<Topics>, callback: F) -> Result<RpcId, WsError>
    where
        F: FnMut(&mut ConnectionContext, &Value) -> anyhow::Result<()> + Send + 'static,
    {
        self.register_boxed(topics.into(), Box::new(callback))
    }

    /// Register without a callback; pushes are accepted and dropped.
    pub fn register_silent(&mut self, topics: impl Into<Topics>) -> Result<RpcId, WsError> {
        self.register_boxed(topics.into(), Box::new(|_, _| Ok(())))
    }

    pub fn register_boxed(&mut self, topics: Topics, callback: Callback) -> Result<RpcId, WsError> {
        let id = Self::next_id();
        let request = JsonRpcRequest::new(id.clone(), SUBSCRIBE, topics.into_params());
        let frame = serde_json::to_string(&request).map_err(WsError::Serialization)?;

        if self.state == ConnectionState::Open {
            self.transport.send(frame.clone())?;
        }

        tracing::debug!(id = %id, params = ?request.params, state = %self.state, "registered subscription");
        self.pending.insert(id.clone());
        self.entries.insert(
            id.clone(),
            SubscriptionEntry {
                request,
                frame,
                callback,
            },
        );
        Ok(id)
    }

    /// Drop a confirmed subscription and send `unsubscribe` for it.
    ///
    /// Fails without side effects if `subscription` is unknown or the
    /// connection is not open. Returns the id of the unsubscribe request.
    pub fn unregister(&mut self, subscription: &SubscriptionId) -> Result<RpcId, WsError> {
        let local = self
            .external
            .get(subscription)
            .cloned()
            .ok_or_else(|| WsError::UnknownSubscription(subscription.clone()))?;
        if self.state != ConnectionState::Open {
            return Err(WsError::NotConnected);
        }

        let id = Self::next_id();
        let request = JsonRpcRequest::new(
            id.clone(),
            UNSUBSCRIBE,
            vec![Value::String(subscription.0.clone())],
        );
        let frame = serde_json::to_string(&request).map_err(WsError::Serialization)?;
        self.transport.send(frame)?;

        self.entries.remove(&local);
        self.external.remove(subscription);
        self.pending.insert(id.clone());
        tracing::debug!(id = %id, subscription = %subscription, "unsubscribe sent");
        Ok(id)
    }

    /// Transport connected: send every stored subscribe payload, then run the
    /// `on_open` hook. Returns the number of payloads sent.
    pub fn handle_open(&mut self) -> Result<usize, WsError> {
        self.state = ConnectionState::Open;
        self.context.close_requested = false;

        let mut flushed = 0;
        for (id, entry) in &self.entries {
            if entry.request.id != *id {
                return Err(WsError::Internal(format!(
                    "payload stored under request {id} carries id {}",
                    entry.request.id
                )));
            }
            self.transport.send(entry.frame.clone())?;
            self.pending.insert(id.clone());
            flushed += 1;
        }
        tracing::debug!(flushed, "subscription table flushed");

        (self.on_open)(&mut self.context);
        Ok(flushed)
    }

    /// Route one inbound text frame.
    ///
    /// Checked in order: a truthy `params` member is a push, a string
    /// `result` confirms a subscribe, a boolean `result` confirms an
    /// unsubscribe, an `error` member is a rejection. A rejection retires
    /// its pending request and drops the rejected subscription. Other errors
    /// leave the manager's state untouched, except that a failing callback
    /// has already run.
    pub fn handle_message(&mut self, raw: &str) -> Result<Dispatched, WsError> {
        let message: Value = serde_json::from_str(raw).map_err(WsError::MalformedFrame)?;

        if message.get("params").is_some_and(is_truthy) {
            let Some(subscription) = message["params"]
                .get("subscription")
                .and_then(Value::as_str)
                .map(SubscriptionId::from)
            else {
                return Err(WsError::UnknownMessage(message));
            };
            let local = self
                .external
                .get(&subscription)
                .ok_or_else(|| WsError::UnknownSubscription(subscription.clone()))?;
            let entry = self.entries.get_mut(local).ok_or_else(|| {
                WsError::Internal(format!(
                    "subscription {subscription} maps to request {local} which has no entry"
                ))
            })?;
            (entry.callback)(&mut self.context, &message).map_err(WsError::Callback)?;
            return Ok(Dispatched::Data { subscription });
        }

        let id = RpcId::from_value(message.get("id"));
        match message.get("result") {
            Some(Value::String(result)) => {
                if !self.pending.remove(&id) {
                    return Err(WsError::UnexpectedAck(id));
                }
                let subscription = SubscriptionId(result.clone());
                self.external.insert(subscription.clone(), id.clone());
                tracing::debug!(id = %id, subscription = %subscription, "subscription confirmed");
                Ok(Dispatched::Subscribed { id, subscription })
            }
            Some(Value::Bool(_)) => {
                if !self.pending.remove(&id) {
                    return Err(WsError::UnexpectedAck(id));
                }
                tracing::debug!(id = %id, "unsubscribe confirmed");
                Ok(Dispatched::Unsubscribed { id })
            }
            _ => match message
                .get("error")
                .and_then(|e| serde_json::from_value::<JsonRpcError>(e.clone()).ok())
            {
                Some(error) => {
                    // The error response is the request's acknowledgement.
                    if self.pending.remove(&id) && self.entries.remove(&id).is_some() {
                        tracing::debug!(id = %id, "subscription rejected and dropped");
                    }
                    Err(WsError::Rejected { id, error })
                }
                None => Err(WsError::UnknownMessage(message)),
            },
        }
    }

    /// Transport error: run the `on_error` hook. State is unchanged.
    pub fn handle_error(&mut self, error: &WsError) {
        (self.on_error)(&mut self.context, error);
    }

    /// Transport closed: run the `on_close` hook.
    ///
    /// Server-assigned ids and outstanding acknowledgements die with the
    /// connection. The subscription table is kept so a later
    /// [`handle_open`](Self::handle_open) replays it.
    pub fn handle_close(&mut self) {
        self.state = ConnectionState::Closed;
        self.pending.clear();
        self.external.clear();
        (self.on_close)(&mut self.context);
    }

    pub fn set_on_open(&mut self, hook: impl FnMut(&mut ConnectionContext) + Send + 'static) {
        self.on_open = Box::new(hook);
    }

    pub fn set_on_close(&mut self, hook: impl FnMut(&mut ConnectionContext) + Send + 'static) {
        self.on_close = Box::new(hook);
    }

    pub fn set_on_error(
        &mut self,
        hook: impl FnMut(&mut ConnectionContext, &WsError) + Send + 'static,
    ) {
        self.on_error = Box::new(hook);
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn context(&self) -> &ConnectionContext {
        &self.context
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Returns `true` if `id` still awaits an acknowledgement.
    pub fn is_pending(&self, id: &RpcId) -> bool {
        self.pending.contains(id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Request id a server subscription id resolves to.
    pub fn local_id(&self, subscription: &SubscriptionId) -> Option<&RpcId> {
        self.external.get(subscription)
    }

    /// Stored subscribe frame for a request id.
    pub fn payload(&self, id: &RpcId) -> Option<&str> {
        self.entries.get(id).map(|e| e.frame.as_str())
    }

    /// Topic parameters of a registered subscription.
    pub fn topics(&self, id: &RpcId) -> Option<&[Value]> {
        self.entries.get(id).map(|e| e.request.params.as_slice())
    }

    /// Number of entries in the subscription table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no subscriptions are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Outbox;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn manager() -> SubscriptionManager<Outbox> {
        SubscriptionManager::new(Outbox::new(), "wss://ws.test/")
    }

    fn recorder() -> (
        Arc<Mutex<Vec<Value>>>,
        impl FnMut(&mut ConnectionContext, &Value) -> anyhow::Result<()> + Send + 'static,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |_: &mut ConnectionContext, msg: &Value| {
            sink.lock().unwrap().push(msg.clone());
            Ok(())
        })
    }

    fn sent(mgr: &mut SubscriptionManager<Outbox>) -> Vec<Value> {
        mgr.transport_mut()
            .drain()
            .iter()
            .map(|f| serde_json::from_str(f).unwrap())
            .collect()
    }

    fn ack(id: &RpcId, result: Value) -> String {
        json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string()
    }

    fn push(subscription: &str, result: Value) -> String {
        json!({
            "jsonrpc": "2.0",
            "method": "subscription",
            "params": {"subscription": subscription, "result": result}
        })
        .to_string()
    }

    /// Registers "block", opens, and confirms it as `sub-123`.
    fn confirmed(
        mgr: &mut SubscriptionManager<Outbox>,
    ) -> (RpcId, Arc<Mutex<Vec<Value>>>) {
        let (seen, cb) = recorder();
        let id = mgr.register("block", cb).unwrap();
        mgr.handle_open().unwrap();
        mgr.transport_mut().drain();
        mgr.handle_message(&ack(&id, json!("sub-123"))).unwrap();
        (id, seen)
    }

    #[test]
    fn request_ids_are_unique() {
        let mut mgr = manager();
        let ids: HashSet<RpcId> = (0..500).map(|_| mgr.register_silent("block").unwrap()).collect();
        assert_eq!(ids.len(), 500);
        assert_eq!(mgr.pending_len(), 500);
    }

    #[test]
    fn register_defers_until_open() {
        let mut mgr = manager();
        let id = mgr.register_silent(["block", "uncle"]).unwrap();

        assert!(mgr.transport().is_empty());
        assert!(mgr.is_pending(&id));
        assert_eq!(mgr.len(), 1);
        assert_eq!(mgr.topics(&id).unwrap(), &[json!("block"), json!("uncle")]);
        assert_eq!(mgr.state(), ConnectionState::Idle);
    }

    #[test]
    fn open_flushes_every_registration_verbatim() {
        let mut mgr = manager();
        let ids: Vec<RpcId> = ["block", "transaction", "pending_transaction"]
            .into_iter()
            .map(|t| mgr.register_silent(t).unwrap())
            .collect();

        let flushed = mgr.handle_open().unwrap();
        assert_eq!(flushed, 3);

        let frames = mgr.transport_mut().drain();
        assert_eq!(frames.len(), 3);
        for id in &ids {
            let stored = mgr.payload(id).unwrap();
            assert_eq!(frames.iter().filter(|f| f.as_str() == stored).count(), 1);
        }
    }

    #[test]
    fn scenario_subscribe_and_confirm() {
        let mut mgr = manager();
        let (_, cb) = recorder();
        let id = mgr.register("block", cb).unwrap();
        mgr.handle_open().unwrap();

        let frames = sent(&mut mgr);
        assert_eq!(
            frames,
            vec![json!({"id": id, "jsonrpc": "2.0", "method": "subscribe", "params": ["block"]})]
        );

        let dispatched = mgr.handle_message(&ack(&id, json!("sub-123"))).unwrap();
        assert_eq!(
            dispatched,
            Dispatched::Subscribed {
                id: id.clone(),
                subscription: "sub-123".into()
            }
        );
        assert!(!mgr.is_pending(&id));
        assert_eq!(mgr.local_id(&"sub-123".into()), Some(&id));
    }

    #[test]
    fn scenario_push_routes_to_callback() {
        let mut mgr = manager();
        let (_, seen) = confirmed(&mut mgr);
        let (other_seen, other_cb) = recorder();
        let other = mgr.register("transaction", other_cb).unwrap();
        mgr.handle_message(&ack(&other, json!("sub-456"))).unwrap();

        let raw = push("sub-123", json!({"number": 42}));
        let dispatched = mgr.handle_message(&raw).unwrap();

        assert_eq!(dispatched, Dispatched::Data { subscription: "sub-123".into() });
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], serde_json::from_str::<Value>(&raw).unwrap());
        assert!(other_seen.lock().unwrap().is_empty());
    }

    #[test]
    fn scenario_unregister() {
        let mut mgr = manager();
        let (local, _) = confirmed(&mut mgr);

        let unsub = mgr.unregister(&"sub-123".into()).unwrap();

        assert!(mgr.is_empty());
        assert!(mgr.payload(&local).is_none());
        assert!(mgr.local_id(&"sub-123".into()).is_none());
        assert!(mgr.is_pending(&unsub));
        assert_ne!(unsub, local);

        let frames = sent(&mut mgr);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["method"], "unsubscribe");
        assert_eq!(frames[0]["params"], json!(["sub-123"]));
        assert_eq!(frames[0]["id"], json!(unsub));

        let dispatched = mgr.handle_message(&ack(&unsub, json!(true))).unwrap();
        assert_eq!(dispatched, Dispatched::Unsubscribed { id: unsub.clone() });
        assert_eq!(mgr.pending_len(), 0);
        assert!(mgr.is_empty());
    }

    #[test]
    fn scenario_unregister_unknown() {
        let mut mgr = manager();
        mgr.handle_open().unwrap();

        let err = mgr.unregister(&"unknown-id".into()).unwrap_err();

        assert!(matches!(err, WsError::UnknownSubscription(ref s) if s.0 == "unknown-id"));
        assert!(mgr.transport().is_empty());
        assert_eq!(mgr.pending_len(), 0);
    }

    #[test]
    fn unregister_requires_open_connection() {
        let mut mgr = manager();
        let (local, _) = confirmed(&mut mgr);
        // Flip the state only; handle_close would also drop the mapping.
        mgr.state = ConnectionState::Closed;

        let err = mgr.unregister(&"sub-123".into()).unwrap_err();
        assert!(matches!(err, WsError::NotConnected));
        assert!(mgr.payload(&local).is_some());
        assert!(mgr.transport().is_empty());
    }

    #[test]
    fn unknown_shape_is_reported_without_mutation() {
        let mut mgr = manager();
        let id = mgr.register_silent("block").unwrap();
        mgr.handle_open().unwrap();
        mgr.transport_mut().drain();

        let err = mgr
            .handle_message(&ack(&id, json!({"invalid": "datatype"})))
            .unwrap_err();

        assert!(matches!(err, WsError::UnknownMessage(_)));
        assert!(mgr.is_pending(&id));
        assert_eq!(mgr.pending_len(), 1);
        assert_eq!(mgr.len(), 1);
        assert!(mgr.transport().is_empty());
    }

    #[test]
    fn malformed_json_is_distinct_from_unknown_shape() {
        let mut mgr = manager();
        let err = mgr.handle_message("invalid").unwrap_err();
        assert!(matches!(err, WsError::MalformedFrame(_)));
        assert!(err.is_protocol_error());
    }

    #[test]
    fn push_for_unknown_subscription() {
        let mut mgr = manager();
        let err = mgr.handle_message(&push("nope", json!({}))).unwrap_err();
        assert!(matches!(err, WsError::UnknownSubscription(ref s) if s.0 == "nope"));
    }

    #[test]
    fn params_without_subscription_is_unknown_shape() {
        let mut mgr = manager();
        let raw = json!({"jsonrpc": "2.0", "method": "subscription", "params": {"result": 1}});
        let err = mgr.handle_message(&raw.to_string()).unwrap_err();
        assert!(matches!(err, WsError::UnknownMessage(_)));
    }

    #[test]
    fn empty_params_fall_through_to_ack() {
        let mut mgr = manager();
        let id = mgr.register_silent("block").unwrap();
        let raw = json!({"jsonrpc": "2.0", "id": id, "params": {}, "result": "sub-1"});
        let dispatched = mgr.handle_message(&raw.to_string()).unwrap();
        assert!(matches!(dispatched, Dispatched::Subscribed { .. }));
    }

    #[test]
    fn ack_is_consumed_once() {
        let mut mgr = manager();
        let id = mgr.register_silent("block").unwrap();
        mgr.handle_message(&ack(&id, json!("sub-1"))).unwrap();

        let err = mgr.handle_message(&ack(&id, json!("sub-2"))).unwrap_err();
        assert!(matches!(err, WsError::UnexpectedAck(ref unexpected) if *unexpected == id));
        assert!(mgr.local_id(&"sub-2".into()).is_none());

        let err = mgr.handle_message(&ack(&RpcId::Number(1), json!(true))).unwrap_err();
        assert!(matches!(err, WsError::UnexpectedAck(RpcId::Number(1))));
    }

    #[test]
    fn error_response_is_rejected() {
        let mut mgr = manager();
        let id = mgr.register_silent("no-such-topic").unwrap();
        let raw = json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": -32602, "message": "invalid params"}
        });

        let err = mgr.handle_message(&raw.to_string()).unwrap_err();
        match err {
            WsError::Rejected { id: rejected, error } => {
                assert_eq!(rejected, id);
                assert_eq!(error.code, -32602);
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
        assert!(!mgr.is_pending(&id));
        assert!(mgr.payload(&id).is_none());
    }

    #[test]
    fn rejected_subscription_is_not_replayed() {
        let mut mgr = manager();
        let id = mgr.register_silent("no-such-topic").unwrap();
        let kept = mgr.register_silent("block").unwrap();
        mgr.handle_open().unwrap();
        mgr.transport_mut().drain();

        let raw = json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32602, "message": "bad topic"}});
        assert!(matches!(
            mgr.handle_message(&raw.to_string()),
            Err(WsError::Rejected { .. })
        ));

        for _ in 0..3 {
            mgr.handle_close();
            assert_eq!(mgr.handle_open().unwrap(), 1);
            assert_eq!(mgr.transport_mut().drain(), vec![mgr.payload(&kept).unwrap().to_string()]);
            assert_eq!(mgr.pending_len(), 1);
            assert_eq!(mgr.len(), 1);
        }

        // A second error for the same id is reported but changes nothing.
        assert!(matches!(
            mgr.handle_message(&raw.to_string()),
            Err(WsError::Rejected { .. })
        ));
        assert!(mgr.is_pending(&kept));
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn acks_out_of_order_route_to_their_own_callbacks() {
        let mut mgr = manager();
        let (seen_a, cb_a) = recorder();
        let (seen_b, cb_b) = recorder();
        let a = mgr.register("block", cb_a).unwrap();
        let b = mgr.register("transaction", cb_b).unwrap();
        assert_eq!(mgr.handle_open().unwrap(), 2);
        mgr.transport_mut().drain();

        mgr.handle_message(&ack(&b, json!("sub-b"))).unwrap();
        assert!(mgr.is_pending(&a));
        mgr.handle_message(&ack(&a, json!("sub-a"))).unwrap();
        assert_eq!(mgr.pending_len(), 0);
        assert_eq!(mgr.local_id(&"sub-a".into()), Some(&a));
        assert_eq!(mgr.local_id(&"sub-b".into()), Some(&b));

        mgr.handle_message(&push("sub-b", json!({"hash": "0xb"}))).unwrap();
        mgr.handle_message(&push("sub-a", json!({"number": 1}))).unwrap();
        mgr.handle_message(&push("sub-b", json!({"hash": "0xc"}))).unwrap();

        let seen_a = seen_a.lock().unwrap();
        let seen_b = seen_b.lock().unwrap();
        assert_eq!(seen_a.len(), 1);
        assert_eq!(seen_a[0]["params"]["result"], json!({"number": 1}));
        assert_eq!(seen_b.len(), 2);
        assert_eq!(seen_b[0]["params"]["result"], json!({"hash": "0xb"}));
        assert_eq!(seen_b[1]["params"]["result"], json!({"hash": "0xc"}));
    }

    #[test]
    fn register_while_open_sends_immediately() {
        let mut mgr = manager();
        mgr.handle_open().unwrap();
        let id = mgr.register_silent("block").unwrap();

        let frames = mgr.transport_mut().drain();
        assert_eq!(frames, vec![mgr.payload(&id).unwrap().to_string()]);
    }

    #[test]
    fn callback_error_propagates() {
        let mut mgr = manager();
        let id = mgr
            .register("block", |_, _| Err(anyhow::anyhow!("handler exploded")))
            .unwrap();
        mgr.handle_open().unwrap();
        mgr.handle_message(&ack(&id, json!("sub-1"))).unwrap();

        let err = mgr.handle_message(&push("sub-1", json!(1))).unwrap_err();
        assert!(matches!(err, WsError::Callback(_)));
        assert!(err.to_string().contains("handler exploded"));
    }

    #[test]
    fn callback_can_request_close() {
        let mut mgr = manager();
        let id = mgr
            .register("block", |ctx, _| {
                ctx.close();
                Ok(())
            })
            .unwrap();
        mgr.handle_open().unwrap();
        mgr.handle_message(&ack(&id, json!("sub-1"))).unwrap();
        assert!(!mgr.context().close_requested());

        mgr.handle_message(&push("sub-1", json!(1))).unwrap();
        assert!(mgr.context().close_requested());
    }

    #[test]
    fn corrupted_entry_aborts_flush() {
        let mut mgr = manager();
        let id = mgr.register_silent("block").unwrap();
        if let Some(entry) = mgr.entries.get_mut(&id) {
            entry.request.id = RpcId::Null;
        }

        let err = mgr.handle_open().unwrap_err();
        assert!(matches!(err, WsError::Internal(_)));
        assert!(mgr.transport().is_empty());
    }

    #[test]
    fn hooks_receive_context() {
        let mut mgr = manager();
        let events = Arc::new(Mutex::new(Vec::new()));

        let e = Arc::clone(&events);
        mgr.set_on_open(move |ctx| e.lock().unwrap().push(format!("open {}", ctx.url())));
        let e = Arc::clone(&events);
        mgr.set_on_error(move |_, err| e.lock().unwrap().push(format!("error {err}")));
        let e = Arc::clone(&events);
        mgr.set_on_close(move |_| e.lock().unwrap().push("close".into()));

        mgr.handle_open().unwrap();
        mgr.handle_error(&WsError::WebSocket("reset".into()));
        mgr.handle_close();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "open wss://ws.test/".to_string(),
                "error WebSocket error: reset".to_string(),
                "close".to_string(),
            ]
        );
        assert_eq!(mgr.state(), ConnectionState::Closed);
    }

    #[test]
    fn reopen_replays_table() {
        let mut mgr = manager();
        let (local, seen) = confirmed(&mut mgr);
        let stored = mgr.payload(&local).unwrap().to_string();

        mgr.handle_close();
        assert!(mgr.local_id(&"sub-123".into()).is_none());
        assert_eq!(mgr.pending_len(), 0);

        assert_eq!(mgr.handle_open().unwrap(), 1);
        assert_eq!(mgr.transport_mut().drain(), vec![stored]);
        assert!(mgr.is_pending(&local));

        mgr.handle_message(&ack(&local, json!("sub-789"))).unwrap();
        mgr.handle_message(&push("sub-789", json!({"number": 7}))).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn topics_builder() {
        let topics = Topics::new("address:logs")
            .with_filter(json!({"address": "0xabc"}));
        assert_eq!(
            topics.as_params(),
            &[json!("address:logs"), json!({"address": "0xabc"})]
        );
        assert_eq!(Topics::from(vec!["a".to_string()]).into_params(), vec![json!("a")]);
        assert_eq!(Topics::new("a").and("b"), Topics::from(["a", "b"]));
    }
}
