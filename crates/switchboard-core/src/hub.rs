//! The hub: registry, listeners and the accept lifecycle.
//!
//! A [`Hub`] owns everything that would otherwise be process-wide state: the
//! connection registry, the listener registry and the configuration. Hosts
//! create one per application and hand every upgraded transport to
//! [`Hub::accept`] or [`Hub::serve`].

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::HubConfig;
use crate::connection::Connection;
use crate::context::RequestContext;
use crate::error::{HubError, HubResult};
use crate::events::{EventPayload, ListenerRegistry};
use crate::frame::Frame;
use crate::id::{ConnectionId, IdGenerator};
use crate::metrics;
use crate::registry::ConnectionRegistry;
use crate::transport::Transport;

/// Point-in-time hub statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Currently registered connections.
    pub active: usize,
    /// Connections accepted since creation.
    pub total_accepted: u64,
    /// Connections refused at admission.
    pub total_rejected: u64,
    /// Connections that completed the terminal transition.
    pub total_closed: u64,
}

/// Owner of the connection and listener registries.
///
/// # Example
///
/// ```ignore
/// use switchboard_core::{Hub, HubConfig, RequestContext};
///
/// let hub = Hub::new(HubConfig::default());
///
/// hub.on("message", |payload| async move {
///     if let Some(text) = payload.text() {
///         let _ = payload.connection.broadcast(text.to_string(), true).await;
///     }
/// });
///
/// // In the upgrade handler:
/// hub.serve(transport, RequestContext::new(), |conn| {
///     conn.set_attribute("user", "alice");
/// })
/// .await?;
/// ```
pub struct Hub {
    config: HubConfig,
    ids: IdGenerator,
    connections: ConnectionRegistry,
    listeners: ListenerRegistry,
    /// Caller-chosen ids ever admitted. They stay taken after removal.
    claimed_ids: Mutex<HashSet<ConnectionId>>,
    total_accepted: AtomicU64,
    total_rejected: AtomicU64,
    total_closed: AtomicU64,
    shutting_down: AtomicBool,
}

impl Hub {
    /// Create a hub.
    pub fn new(config: HubConfig) -> Arc<Self> {
        let ids = IdGenerator::new(config.id_length, config.max_id_attempts);
        Arc::new(Self {
            config,
            ids,
            connections: ConnectionRegistry::new(),
            listeners: ListenerRegistry::new(),
            claimed_ids: Mutex::new(HashSet::new()),
            total_accepted: AtomicU64::new(0),
            total_rejected: AtomicU64::new(0),
            total_closed: AtomicU64::new(0),
            shutting_down: AtomicBool::new(false),
        })
    }

    /// Create a hub with default configuration.
    pub fn with_defaults() -> Arc<Self> {
        Self::new(HubConfig::default())
    }

    /// Get the configuration.
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// The connection registry.
    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    /// The listener registry.
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Register a listener for `event`.
    ///
    /// Listeners for one event run in registration order.
    pub fn on<F, Fut>(&self, event: impl Into<String>, callback: F)
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.listeners.register(event, callback);
    }

    /// Look up a registered connection.
    pub fn get(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.get(id)
    }

    /// Check if an id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.connections.exists(id)
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Check if no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Ids of all registered connections.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.ids()
    }

    /// Get statistics.
    pub fn stats(&self) -> HubStats {
        HubStats {
            active: self.connections.len(),
            total_accepted: self.total_accepted.load(Ordering::Relaxed),
            total_rejected: self.total_rejected.load(Ordering::Relaxed),
            total_closed: self.total_closed.load(Ordering::Relaxed),
        }
    }

    /// Accept a transport under a generated id.
    ///
    /// Registers the connection, runs `setup` synchronously, starts the send
    /// loop, fires `connect`, then starts the read and heartbeat loops.
    pub async fn accept<T, F>(
        self: &Arc<Self>,
        transport: T,
        context: RequestContext,
        setup: F,
    ) -> HubResult<Arc<Connection>>
    where
        T: Transport,
        F: FnOnce(&Arc<Connection>),
    {
        self.admit(Arc::new(transport), context, None, setup).await
    }

    /// Accept a transport under a caller-chosen id.
    ///
    /// Fails with [`HubError::IdentifierCollision`] if `id` is registered or
    /// was used by a connection that has since been removed.
    pub async fn accept_with_id<T, F>(
        self: &Arc<Self>,
        id: impl Into<ConnectionId>,
        transport: T,
        context: RequestContext,
        setup: F,
    ) -> HubResult<Arc<Connection>>
    where
        T: Transport,
        F: FnOnce(&Arc<Connection>),
    {
        self.admit(Arc::new(transport), context, Some(id.into()), setup)
            .await
    }

    /// Accept a transport and wait until the connection has disconnected.
    ///
    /// Suited to host handlers that own the socket for its whole lifetime.
    pub async fn serve<T, F>(
        self: &Arc<Self>,
        transport: T,
        context: RequestContext,
        setup: F,
    ) -> HubResult<()>
    where
        T: Transport,
        F: FnOnce(&Arc<Connection>),
    {
        let conn = self.accept(transport, context, setup).await?;
        conn.closed().await;
        Ok(())
    }

    async fn admit<F>(
        self: &Arc<Self>,
        transport: Arc<dyn Transport>,
        context: RequestContext,
        id: Option<ConnectionId>,
        setup: F,
    ) -> HubResult<Arc<Connection>>
    where
        F: FnOnce(&Arc<Connection>),
    {
        let registered = self.register(Arc::clone(&transport), context, id);
        let (conn, queue) = match registered {
            Ok(registered) => registered,
            Err(err) => {
                if let Err(e) = transport.close().await {
                    debug!(error = %e, "Transport close failed");
                }
                return Err(err);
            }
        };

        self.total_accepted.fetch_add(1, Ordering::Relaxed);
        metrics::record_accepted();
        debug!(
            connection_id = %conn.id(),
            total = self.connections.len(),
            "Connection accepted"
        );

        setup(&conn);
        conn.start(queue).await;
        Ok(conn)
    }

    fn register(
        self: &Arc<Self>,
        transport: Arc<dyn Transport>,
        context: RequestContext,
        id: Option<ConnectionId>,
    ) -> HubResult<(Arc<Connection>, mpsc::Receiver<Frame>)> {
        if self.is_shutting_down() {
            self.reject(&HubError::ShuttingDown);
            return Err(HubError::ShuttingDown);
        }

        let explicit = id.is_some();
        let id = match id {
            Some(id) if self.claimed_ids.lock().contains(&id) => {
                return Err(HubError::collision(id));
            }
            Some(id) => id,
            None => self.ids.generate(|candidate| {
                self.connections.exists(candidate) || self.claimed_ids.lock().contains(candidate)
            })?,
        };

        let (conn, queue) = Connection::new(id.clone(), Arc::clone(self), transport, context);
        let max = self.config.max_connections;
        match self.connections.insert_bounded(id.clone(), Arc::clone(&conn), max) {
            Ok(()) => {
                if explicit {
                    self.claimed_ids.lock().insert(id);
                }
                Ok((conn, queue))
            }
            Err(err) => {
                if matches!(err, HubError::ConnectionLimitReached { .. }) {
                    self.reject(&err);
                }
                Err(err)
            }
        }
    }

    fn reject(&self, err: &HubError) {
        self.total_rejected.fetch_add(1, Ordering::Relaxed);
        metrics::record_rejected(err.reason());
        warn!(error = %err, "Connection rejected");
    }

    pub(crate) fn record_closed(&self) {
        self.total_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Check if shutdown has started.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Refuse new connections and close every live one.
    ///
    /// Closes run concurrently, so a connection stuck on a full queue does
    /// not hold up the others. Returns the number of connections a close was
    /// started for. Calling it again only closes connections that are still
    /// live.
    pub async fn shutdown(&self) -> usize {
        if !self.shutting_down.swap(true, Ordering::SeqCst) {
            info!(active = self.connections.len(), "Hub shutting down");
        }

        let live: Vec<_> = self
            .connections
            .snapshot()
            .into_iter()
            .filter(|conn| conn.is_alive())
            .collect();
        join_all(live.iter().map(|conn| conn.close())).await;
        live.len()
    }

    /// Drop every connection without firing events and accept again.
    ///
    /// Listeners and counters are kept. Caller-chosen ids become free again.
    /// Intended for tests.
    pub fn reset(&self) {
        for conn in self.connections.snapshot() {
            conn.abort();
        }
        self.connections.clear();
        self.claimed_ids.lock().clear();
        self.shutting_down.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .field("listeners", &self.listeners)
            .field("shutting_down", &self.is_shutting_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EVENT_CONNECT;
    use crate::fixtures::MockTransport;
    use parking_lot::Mutex;
    use std::time::Duration;

    fn test_config() -> HubConfig {
        HubConfig::new()
            .id_length(24)
            .heartbeat_interval(Duration::ZERO)
            .max_connections(3)
    }

    async fn accept(hub: &Arc<Hub>) -> Arc<Connection> {
        hub.accept(MockTransport::new(), RequestContext::new(), |_| {})
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_accept_registers() {
        let hub = Hub::new(test_config());
        let conn = accept(&hub).await;

        assert_eq!(conn.id().len(), 24);
        assert!(conn.id().as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(hub.contains(conn.id().as_str()));
        assert!(conn.is_alive());
        assert_eq!(hub.len(), 1);
    }

    #[tokio::test]
    async fn test_setup_runs_before_connect() {
        let hub = Hub::new(test_config());
        let seen = Arc::new(Mutex::new(None));
        let seen_in_listener = Arc::clone(&seen);
        hub.on(EVENT_CONNECT, move |payload| {
            let seen = Arc::clone(&seen_in_listener);
            async move {
                *seen.lock() = payload.attribute("room").map(str::to_string);
            }
        });

        hub.accept(MockTransport::new(), RequestContext::new(), |conn| {
            conn.set_attribute("room", "lobby");
        })
        .await
        .unwrap();

        assert_eq!(seen.lock().as_deref(), Some("lobby"));
    }

    #[tokio::test]
    async fn test_connect_listener_emits_are_flushed() {
        let hub = Hub::new(test_config());
        hub.on(EVENT_CONNECT, |payload| async move {
            let _ = payload.connection.emit("welcome").await;
        });

        let transport = MockTransport::new();
        hub.accept(transport.clone(), RequestContext::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(transport.wait_for_writes(1).await[0], Frame::text("welcome"));
    }

    #[tokio::test]
    async fn test_accept_with_id() {
        let hub = Hub::new(test_config());
        let conn = hub
            .accept_with_id("fixed", MockTransport::new(), RequestContext::new(), |_| {})
            .await
            .unwrap();
        assert_eq!(conn.id().as_str(), "fixed");

        let transport = MockTransport::new();
        let err = hub
            .accept_with_id("fixed", transport.clone(), RequestContext::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, HubError::IdentifierCollision { .. }));
        assert!(transport.is_closed());
        assert_eq!(hub.len(), 1);
    }

    #[tokio::test]
    async fn test_removed_id_is_not_reused() {
        let hub = Hub::new(test_config());
        let conn = hub
            .accept_with_id("fixed", MockTransport::new(), RequestContext::new(), |_| {})
            .await
            .unwrap();
        conn.close().await;
        conn.closed().await;
        assert!(!hub.contains("fixed"));

        let transport = MockTransport::new();
        let err = hub
            .accept_with_id("fixed", transport.clone(), RequestContext::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, HubError::IdentifierCollision { .. }));
        assert!(transport.is_closed());
        assert!(hub.is_empty());

        hub.reset();
        hub.accept_with_id("fixed", MockTransport::new(), RequestContext::new(), |_| {})
            .await
            .unwrap();
        assert!(hub.contains("fixed"));
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let hub = Hub::new(test_config());
        for _ in 0..3 {
            accept(&hub).await;
        }

        let err = hub
            .accept(MockTransport::new(), RequestContext::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, HubError::ConnectionLimitReached { max: 3 }));

        let stats = hub.stats();
        assert_eq!(stats.active, 3);
        assert_eq!(stats.total_accepted, 3);
        assert_eq!(stats.total_rejected, 1);
    }

    #[tokio::test]
    async fn test_context_is_passed_through() {
        let hub = Hub::new(test_config());
        let conn = hub
            .accept(
                MockTransport::new(),
                RequestContext::new().with_param("room", "42"),
                |_| {},
            )
            .await
            .unwrap();
        assert_eq!(conn.context().param("room"), Some("42"));
    }

    #[tokio::test]
    async fn test_shutdown_closes_and_refuses() {
        let hub = Hub::new(test_config());
        let a = accept(&hub).await;
        let b = accept(&hub).await;

        assert_eq!(hub.shutdown().await, 2);
        assert!(hub.is_shutting_down());
        a.closed().await;
        b.closed().await;
        assert!(hub.is_empty());

        let err = hub
            .accept(MockTransport::new(), RequestContext::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, HubError::ShuttingDown));

        assert_eq!(hub.shutdown().await, 0);
        assert_eq!(hub.stats().total_closed, 2);
    }

    #[tokio::test]
    async fn test_reset_clears_registry() {
        let hub = Hub::new(test_config());
        let conn = accept(&hub).await;
        hub.shutdown().await;

        hub.reset();
        conn.closed().await;

        assert!(hub.is_empty());
        assert!(!hub.is_shutting_down());
        accept(&hub).await;
        assert_eq!(hub.len(), 1);
    }

    #[tokio::test]
    async fn test_serve_returns_after_disconnect() {
        let hub = Hub::new(test_config());
        let transport = MockTransport::new();
        let served = tokio::spawn({
            let hub = Arc::clone(&hub);
            let transport = transport.clone();
            async move { hub.serve(transport, RequestContext::new(), |_| {}).await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        transport.push(Frame::close_empty());

        served.await.unwrap().unwrap();
        assert!(hub.is_empty());
    }
}
