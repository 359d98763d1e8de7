//! Connection registry, per-connection runtime and event fan-out.
//!
//! This crate turns independently accepted duplex connections into an
//! addressable set. Each connection gets a unique id, runs its own read, send
//! and heartbeat loops, and surfaces socket activity as named events that
//! application code listens to. Any task can address a connection by id, a
//! list of ids, or every connection at once.
//!
//! # Features
//!
//! - **Transport agnostic**: anything implementing [`Transport`] can be
//!   accepted; `switchboard-ws` binds `tokio-tungstenite`
//! - **Event model** with `connect`, `message`, `ping`, `pong`, `close`,
//!   `disconnect`, `error` and custom events
//! - **Fan-out** by id, id list and broadcast, with per-target failure
//!   isolation
//! - **Backpressure** through a bounded outbound queue per connection
//! - **Graceful shutdown** with close frames sent to every connection
//!
//! # Example
//!
//! ```ignore
//! use switchboard_core::{Hub, HubConfig, RequestContext, EVENT_MESSAGE};
//!
//! let hub = Hub::new(HubConfig::default());
//!
//! hub.on(EVENT_MESSAGE, |payload| async move {
//!     // Echo to everyone else
//!     if let Some(data) = payload.data.clone() {
//!         payload.connection.broadcast(data, true).await;
//!     }
//! });
//!
//! // For each upgraded socket:
//! hub.serve(transport, RequestContext::new(), |conn| {
//!     conn.set_attribute("user", "alice");
//! })
//! .await?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Connection Flow                       │
//! │                                                              │
//! │  Hub::accept() ──► id ──► ConnectionRegistry.insert()        │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  setup(&conn) ──► send loop ──► "connect" ──► read/heartbeat │
//! │                                                              │
//! │  read loop ──► "message" / "ping" / "pong" ──► listeners     │
//! │                                                              │
//! │  emit_to / broadcast ──► registry lookup ──► target queue    │
//! │                                   │                          │
//! │                                   ▼                          │
//! │                  send loop ──► Transport::write_frame()      │
//! │                                                              │
//! │  remote close / I/O error / close frame written              │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  terminate (once) ──► unregister ──► "disconnect" ──► close  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! A connection is live in [`ConnectionState::Connecting`] and
//! [`ConnectionState::Active`]. A server-initiated [`Connection::close`]
//! moves it to [`ConnectionState::Closing`]: it stays registered but sends to
//! it fail with [`HubError::Dead`] until the close frame is written and it
//! leaves the registry.

pub mod config;
pub mod connection;
pub mod context;
pub mod error;
pub mod events;
pub mod fanout;
pub mod fixtures;
pub mod frame;
pub mod hub;
pub mod id;
pub mod metrics;
pub mod registry;
pub mod transport;

// Re-exports for convenience
pub use config::HubConfig;
pub use connection::{Connection, ConnectionState};
pub use context::RequestContext;
pub use error::{CloseCode, HubError, HubResult, TransportError};
pub use events::{
    EventPayload, Listener, ListenerRegistry, EVENT_CLOSE, EVENT_CONNECT, EVENT_DISCONNECT,
    EVENT_ERROR, EVENT_MESSAGE, EVENT_PING, EVENT_PONG,
};
pub use fanout::FanoutReport;
pub use frame::{CloseFrame, Frame, FrameKind};
pub use hub::{Hub, HubStats};
pub use id::{ConnectionId, IdGenerator};
pub use registry::{ConnectionRegistry, Registry};
pub use transport::Transport;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exports() {
        let _config = HubConfig::default();
        let _ctx = RequestContext::new();
        let _id = ConnectionId::new("abc");
        let _frame = Frame::text("hello");
        let _close = CloseCode::Normal;
        let _report = FanoutReport::default();
    }
}
