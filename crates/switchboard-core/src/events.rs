//! Event names, payloads and the listener registry.
//!
//! Listeners are registered per event name and invoked in registration order.
//! Each invocation receives its own [`EventPayload`]; the registry hands out
//! copies of its listener lists so dispatch never runs under the lock.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::RwLock;

use crate::connection::Connection;
use crate::error::HubError;
use crate::id::ConnectionId;

/// Fired once a connection is registered and its send loop is running.
pub const EVENT_CONNECT: &str = "connect";
/// Fired for every inbound text or binary frame.
pub const EVENT_MESSAGE: &str = "message";
/// Fired for every inbound ping frame.
pub const EVENT_PING: &str = "ping";
/// Fired for every inbound pong frame.
pub const EVENT_PONG: &str = "pong";
/// Fired once when a connection leaves the registry.
pub const EVENT_DISCONNECT: &str = "disconnect";
/// Fired when the server starts closing a connection.
pub const EVENT_CLOSE: &str = "close";
/// Fired on failed connection-scoped sends and on error-driven disconnects.
pub const EVENT_ERROR: &str = "error";

/// What a listener receives.
#[derive(Clone)]
pub struct EventPayload {
    /// The connection the event fired on.
    pub connection: Arc<Connection>,
    /// The event name.
    pub name: String,
    /// The connection id.
    pub connection_id: ConnectionId,
    /// A copy of the connection attributes at fire time.
    pub attributes: HashMap<String, String>,
    /// The error that caused the event, if any.
    pub error: Option<HubError>,
    /// Raw event data, if any.
    pub data: Option<Bytes>,
}

impl EventPayload {
    /// The data as UTF-8 text, if present and valid.
    pub fn text(&self) -> Option<&str> {
        self.data
            .as_deref()
            .and_then(|data| std::str::from_utf8(data).ok())
    }

    /// Look up an attribute in the copied attribute map.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

impl fmt::Debug for EventPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPayload")
            .field("name", &self.name)
            .field("connection_id", &self.connection_id)
            .field("attributes", &self.attributes)
            .field("error", &self.error)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

/// A registered event callback.
pub type Listener = Arc<dyn Fn(EventPayload) -> BoxFuture<'static, ()> + Send + Sync>;

/// Append-only `event name -> ordered listeners` store.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener for `event`.
    pub fn register<F, Fut>(&self, event: impl Into<String>, callback: F)
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener: Listener = Arc::new(move |payload| callback(payload).boxed());
        self.listeners
            .write()
            .entry(event.into())
            .or_default()
            .push(listener);
    }

    /// A copy of the listeners for `event`, in registration order.
    ///
    /// Unknown events yield an empty list.
    pub fn listeners_for(&self, event: &str) -> Vec<Listener> {
        self.listeners
            .read()
            .get(event)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of listeners registered for `event`.
    pub fn count(&self, event: &str) -> usize {
        self.listeners.read().get(event).map_or(0, Vec::len)
    }

    /// Invoke every listener for the payload's event, one after another.
    pub(crate) async fn dispatch(&self, payload: EventPayload) {
        for listener in self.listeners_for(&payload.name) {
            listener(payload.clone()).await;
        }
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.read();
        let counts: HashMap<&str, usize> = listeners
            .iter()
            .map(|(event, list)| (event.as_str(), list.len()))
            .collect();
        f.debug_struct("ListenerRegistry")
            .field("listeners", &counts)
            .finish()
    }
}
