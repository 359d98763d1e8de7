//! Per-connection runtime.
//!
//! A [`Connection`] owns one transport and runs up to three tasks over it:
//!
//! - the **send loop** drains the bounded outbound queue into the transport,
//! - the **read loop** turns inbound frames into events,
//! - the **heartbeat loop** enqueues an empty ping or pong on an interval.
//!
//! All three select on a shared cancellation token. The terminal transition
//! (remote close, transport error, or the send loop writing a server close
//! frame) runs exactly once: it unregisters the connection, cancels the loops,
//! fires `disconnect` (and `error` if an error caused it) and closes the
//! transport.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::error::{CloseCode, HubError, HubResult};
use crate::events::{
    EventPayload, EVENT_CLOSE, EVENT_CONNECT, EVENT_DISCONNECT, EVENT_ERROR, EVENT_MESSAGE,
    EVENT_PING, EVENT_PONG,
};
use crate::frame::{Frame, FrameKind};
use crate::hub::Hub;
use crate::id::ConnectionId;
use crate::metrics;
use crate::transport::Transport;

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Registered, setup and `connect` listeners are running.
    Connecting,
    /// All loops are running.
    Active,
    /// A server close frame is queued; no longer addressable.
    Closing,
    /// Terminal. The connection has left the registry.
    Disconnected,
}

impl ConnectionState {
    /// Check if the connection is live in this state.
    pub fn is_alive(self) -> bool {
        matches!(self, Self::Connecting | Self::Active)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Active => write!(f, "active"),
            Self::Closing => write!(f, "closing"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// One accepted transport connection.
///
/// Connections are created by [`Hub::accept`] and always handled through an
/// `Arc`.
pub struct Connection {
    id: ConnectionId,
    hub: Arc<Hub>,
    state: Mutex<ConnectionState>,
    attributes: RwLock<HashMap<String, String>>,
    outbound: mpsc::Sender<Frame>,
    transport: Arc<dyn Transport>,
    context: RequestContext,
    /// Stops the loops.
    cancel: CancellationToken,
    /// Cancelled once the terminal transition has fully run.
    terminated: CancellationToken,
    connected_at: Instant,
}

impl Connection {
    pub(crate) fn new(
        id: ConnectionId,
        hub: Arc<Hub>,
        transport: Arc<dyn Transport>,
        context: RequestContext,
    ) -> (Arc<Self>, mpsc::Receiver<Frame>) {
        let (outbound, queue) = mpsc::channel(hub.config().queue_capacity.max(1));
        let connection = Arc::new(Self {
            id,
            hub,
            state: Mutex::new(ConnectionState::Connecting),
            attributes: RwLock::new(HashMap::new()),
            outbound,
            transport,
            context,
            cancel: CancellationToken::new(),
            terminated: CancellationToken::new(),
            connected_at: Instant::now(),
        });
        (connection, queue)
    }

    /// The connection id.
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// The hub this connection belongs to.
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Check if the connection is live.
    ///
    /// Liveness is monotonic: once false it never becomes true again.
    pub fn is_alive(&self) -> bool {
        self.state().is_alive()
    }

    /// The request accessors captured at accept time.
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// How long ago the connection was accepted.
    pub fn duration(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Set an attribute.
    pub fn set_attribute(&self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.write().insert(key.into(), value.into());
    }

    /// Get an attribute.
    pub fn attribute(&self, key: &str) -> Option<String> {
        self.attributes.read().get(key).cloned()
    }

    /// A copy of all attributes.
    pub fn attributes(&self) -> HashMap<String, String> {
        self.attributes.read().clone()
    }

    /// Wait until the terminal transition has completed.
    pub async fn closed(&self) {
        self.terminated.cancelled().await;
    }

    /// Queue a text frame for this connection.
    pub async fn emit(&self, payload: impl Into<Bytes>) -> HubResult<()> {
        self.emit_frame(Frame::new(FrameKind::Text, payload)).await
    }

    /// Queue a binary frame for this connection.
    pub async fn emit_binary(&self, payload: impl Into<Bytes>) -> HubResult<()> {
        self.emit_frame(Frame::binary(payload)).await
    }

    /// Queue an arbitrary frame for this connection.
    ///
    /// Waits while the outbound queue is full. Fails with
    /// [`HubError::Dead`] if the connection is no longer live.
    pub async fn emit_frame(&self, frame: Frame) -> HubResult<()> {
        if !self.is_alive() {
            return Err(HubError::dead(&self.id));
        }
        self.enqueue(frame).await
    }

    /// Start a server-initiated close.
    ///
    /// Enters [`ConnectionState::Closing`], fires `close` and queues a close
    /// frame. The connection disconnects once the send loop has written it.
    /// If the frame cannot be queued within
    /// [`HubConfig::close_timeout`](crate::HubConfig::close_timeout) the
    /// connection is terminated without it. Does nothing if the connection
    /// is already closing or gone.
    pub async fn close(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            if !state.is_alive() {
                return;
            }
            *state = ConnectionState::Closing;
        }
        debug!(connection_id = %self.id, "Closing connection");

        self.fire_event(EVENT_CLOSE, None, None).await;

        let config = self.hub.config();
        let frame = Frame::close(CloseCode::Normal, config.close_reason.clone());
        match tokio::time::timeout(config.close_timeout, self.enqueue(frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => self.terminate(None).await,
            Err(_) => {
                warn!(
                    connection_id = %self.id,
                    timeout = ?config.close_timeout,
                    "Close frame not queued in time, dropping connection"
                );
                self.terminate(None).await;
            }
        }
    }

    /// Fire a custom event on this connection.
    pub async fn fire(self: &Arc<Self>, event: &str, data: impl Into<Bytes>) {
        self.fire_event(event, Some(data.into()), None).await;
    }

    pub(crate) async fn fire_event(
        self: &Arc<Self>,
        event: &str,
        data: Option<Bytes>,
        error: Option<HubError>,
    ) {
        let payload = EventPayload {
            connection: Arc::clone(self),
            name: event.to_string(),
            connection_id: self.id.clone(),
            attributes: self.attributes(),
            error,
            data,
        };
        self.hub.listeners().dispatch(payload).await;
    }

    /// Append to the outbound queue regardless of state.
    ///
    /// Fails with [`HubError::Dead`] once the send loop has exited.
    pub(crate) async fn enqueue(&self, frame: Frame) -> HubResult<()> {
        self.outbound
            .send(frame)
            .await
            .map_err(|_| HubError::dead(&self.id))
    }

    /// Run the post-registration lifecycle.
    ///
    /// The send loop starts before `connect` fires so frames queued by
    /// `connect` listeners are flushed.
    pub(crate) async fn start(self: &Arc<Self>, queue: mpsc::Receiver<Frame>) {
        tokio::spawn(Arc::clone(self).send_loop(queue));

        self.fire_event(EVENT_CONNECT, None, None).await;

        {
            let mut state = self.state.lock();
            if *state == ConnectionState::Connecting {
                *state = ConnectionState::Active;
            }
        }

        if !self.hub.config().heartbeat_interval.is_zero() {
            tokio::spawn(Arc::clone(self).heartbeat_loop());
        }
        tokio::spawn(Arc::clone(self).read_loop());
    }

    /// The terminal transition. Only the first call has any effect.
    pub(crate) async fn terminate(self: &Arc<Self>, error: Option<HubError>) {
        {
            let mut state = self.state.lock();
            if *state == ConnectionState::Disconnected {
                return;
            }
            *state = ConnectionState::Disconnected;
        }

        self.hub.connections().remove(self.id.as_str());
        self.cancel.cancel();
        self.hub.record_closed();
        metrics::record_disconnected();

        match &error {
            Some(err) => warn!(connection_id = %self.id, error = %err, "Connection lost"),
            None => debug!(connection_id = %self.id, "Connection disconnected"),
        }

        self.fire_event(EVENT_DISCONNECT, None, error.clone()).await;
        if let Some(err) = error {
            self.fire_event(EVENT_ERROR, None, Some(err)).await;
        }

        if let Err(e) = self.transport.close().await {
            debug!(connection_id = %self.id, error = %e, "Transport close failed");
        }
        self.terminated.cancel();
    }

    /// Stop the loops without firing events. Used by [`Hub::reset`].
    pub(crate) fn abort(&self) {
        *self.state.lock() = ConnectionState::Disconnected;
        self.cancel.cancel();
        self.terminated.cancel();
    }

    async fn send_loop(self: Arc<Self>, mut queue: mpsc::Receiver<Frame>) {
        loop {
            let frame = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                frame = queue.recv() => match frame {
                    Some(frame) => frame,
                    None => break,
                },
            };

            let kind = frame.kind;
            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                result = self.transport.write_frame(frame) => result,
            };

            match result {
                Ok(()) => metrics::record_frame_sent(kind),
                Err(e) => {
                    self.terminate(Some(e.into())).await;
                    break;
                }
            }

            if kind == FrameKind::Close {
                self.terminate(None).await;
                break;
            }
        }
        debug!(connection_id = %self.id, "Send loop exited");
    }

    async fn read_loop(self: Arc<Self>) {
        loop {
            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                result = self.transport.read_frame() => result,
            };

            let frame = match result {
                Ok(frame) => frame,
                Err(e) => {
                    self.terminate(Some(e.into())).await;
                    break;
                }
            };
            metrics::record_frame_received(frame.kind);

            let event = match frame.kind {
                FrameKind::Text | FrameKind::Binary => EVENT_MESSAGE,
                FrameKind::Ping => EVENT_PING,
                FrameKind::Pong => EVENT_PONG,
                FrameKind::Close => {
                    self.terminate(None).await;
                    break;
                }
            };
            self.fire_event(event, Some(frame.payload), None).await;
        }
        debug!(connection_id = %self.id, "Read loop exited");
    }

    async fn heartbeat_loop(self: Arc<Self>) {
        let config = self.hub.config();
        let period = config.heartbeat_interval;
        let kind = config.heartbeat_kind;
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let sent = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                sent = self.enqueue(Frame::new(kind, Bytes::new())) => sent,
            };
            if sent.is_err() {
                break;
            }
        }
        debug!(connection_id = %self.id, "Heartbeat loop exited");
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("attributes", &self.attributes())
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HubConfig;
    use crate::fixtures::MockTransport;

    fn quiet_hub() -> Arc<Hub> {
        Hub::new(
            HubConfig::new()
                .id_length(16)
                .heartbeat_interval(Duration::ZERO),
        )
    }

    #[test]
    fn test_state_liveness() {
        assert!(ConnectionState::Connecting.is_alive());
        assert!(ConnectionState::Active.is_alive());
        assert!(!ConnectionState::Closing.is_alive());
        assert!(!ConnectionState::Disconnected.is_alive());
        assert_eq!(ConnectionState::Closing.to_string(), "closing");
    }

    #[tokio::test]
    async fn test_attributes() {
        let hub = quiet_hub();
        let conn = hub
            .accept(MockTransport::new(), RequestContext::new(), |conn| {
                conn.set_attribute("user", "alice");
            })
            .await
            .unwrap();

        assert_eq!(conn.attribute("user").as_deref(), Some("alice"));
        assert_eq!(conn.attribute("missing"), None);

        let mut copy = conn.attributes();
        copy.insert("user".into(), "bob".into());
        assert_eq!(conn.attribute("user").as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_emit_writes_text_frame() {
        let hub = quiet_hub();
        let transport = MockTransport::new();
        let conn = hub
            .accept(transport.clone(), RequestContext::new(), |_| {})
            .await
            .unwrap();

        conn.emit("hello").await.unwrap();
        conn.emit_binary(vec![1u8, 2]).await.unwrap();

        let written = transport.wait_for_writes(2).await;
        assert_eq!(written[0], Frame::text("hello"));
        assert_eq!(written[1], Frame::binary(vec![1u8, 2]));
    }

    #[tokio::test]
    async fn test_close_sends_close_frame_then_disconnects() {
        let hub = quiet_hub();
        let transport = MockTransport::new();
        let conn = hub
            .accept(transport.clone(), RequestContext::new(), |_| {})
            .await
            .unwrap();

        conn.close().await;
        assert!(!conn.is_alive());

        conn.closed().await;
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(!hub.contains(conn.id().as_str()));
        assert!(transport.is_closed());

        let written = transport.written();
        let close = written.last().and_then(Frame::close_frame).unwrap();
        assert_eq!(close.code, 1000);
        assert_eq!(close.reason, "Connection closed");
    }

    #[tokio::test]
    async fn test_emit_after_close_is_dead() {
        let hub = quiet_hub();
        let conn = hub
            .accept(MockTransport::new(), RequestContext::new(), |_| {})
            .await
            .unwrap();

        conn.close().await;
        let err = conn.emit("late").await.unwrap_err();
        assert!(matches!(err, HubError::Dead { .. }));
    }

    #[tokio::test]
    async fn test_close_twice_is_noop() {
        let hub = quiet_hub();
        let conn = hub
            .accept(MockTransport::new(), RequestContext::new(), |_| {})
            .await
            .unwrap();

        conn.close().await;
        conn.close().await;
        conn.closed().await;
        assert_eq!(hub.stats().total_closed, 1);
    }

    #[tokio::test]
    async fn test_remote_close_disconnects() {
        let hub = quiet_hub();
        let transport = MockTransport::new();
        let conn = hub
            .accept(transport.clone(), RequestContext::new(), |_| {})
            .await
            .unwrap();

        transport.push(Frame::close_empty());
        conn.closed().await;

        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(hub.is_empty());
    }

    #[tokio::test]
    async fn test_read_error_disconnects() {
        let hub = quiet_hub();
        let transport = MockTransport::new();
        let conn = hub
            .accept(transport.clone(), RequestContext::new(), |_| {})
            .await
            .unwrap();

        transport.fail_read(crate::error::TransportError::Closed);
        conn.closed().await;

        assert!(!conn.is_alive());
        assert!(!hub.contains(conn.id().as_str()));
    }

    #[tokio::test]
    async fn test_write_error_disconnects() {
        let hub = quiet_hub();
        let transport = MockTransport::new();
        transport.fail_writes();
        let conn = hub
            .accept(transport.clone(), RequestContext::new(), |_| {})
            .await
            .unwrap();

        conn.emit("boom").await.unwrap();
        conn.closed().await;
        assert!(hub.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_enqueues_pong() {
        let hub = Hub::new(HubConfig::new().id_length(16));
        let transport = MockTransport::new();
        let _conn = hub
            .accept(transport.clone(), RequestContext::new(), |_| {})
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(3500)).await;

        let written = transport.written();
        assert_eq!(written.len(), 3);
        assert!(written
            .iter()
            .all(|f| f.kind == FrameKind::Pong && f.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_ping_kind() {
        let hub = Hub::new(
            HubConfig::new()
                .id_length(16)
                .heartbeat_interval(Duration::from_millis(100))
                .heartbeat_ping(),
        );
        let transport = MockTransport::new();
        let _conn = hub
            .accept(transport.clone(), RequestContext::new(), |_| {})
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(250)).await;

        let written = transport.written();
        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|f| f.kind == FrameKind::Ping));
    }
}
