//! # Switchboard
//!
//! **Real-time connection hub for WebSocket services**
//!
//! Switchboard keeps a registry of live connections, runs each one with its
//! own read, send and heartbeat loops, and fans events out to listeners and
//! to other connections:
//!
//! - **Registry** – unique generated ids, checked lookup, connection limits
//! - **Per-connection runtime** – bounded outbound queue, heartbeats, exactly-once teardown
//! - **Events** – `connect`, `message`, `ping`, `pong`, `close`, `disconnect`, `error`
//! - **Fan-out** – targeted, list and broadcast sends with per-target failure reports
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use switchboard::prelude::*;
//!
//! let hub = Hub::new(HubConfig::default());
//!
//! hub.on(EVENT_MESSAGE, |payload| async move {
//!     if let Some(data) = payload.data {
//!         payload.connection.broadcast(data, true).await;
//!     }
//! });
//!
//! // In the host framework's upgrade handler:
//! serve_socket(&hub, upgraded, &WebSocketConfig::default(), RequestContext::new(), |conn| {
//!     conn.set_attribute("user", "alice");
//! })
//! .await?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! transport → read loop → listeners ─┐
//!                                    ├→ emit / emit_to / broadcast → outbound queue → send loop → transport
//! heartbeat ─────────────────────────┘
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use switchboard_core as core;

// Re-export WebSocket binding
pub use switchboard_ws as ws;

// Re-export telemetry setup
pub use switchboard_telemetry as telemetry;

// Re-export configuration loading
pub use switchboard_config as config;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use switchboard::prelude::*;
/// ```
pub mod prelude {
    pub use switchboard_core::{
        CloseCode, Connection, ConnectionId, ConnectionState, EventPayload, FanoutReport, Frame,
        FrameKind, Hub, HubConfig, HubError, HubResult, HubStats, RequestContext, Transport,
        TransportError, EVENT_CLOSE, EVENT_CONNECT, EVENT_DISCONNECT, EVENT_ERROR, EVENT_MESSAGE,
        EVENT_PING, EVENT_PONG,
    };

    // Re-export WebSocket types
    pub use switchboard_ws::{
        accept_handshake, complete_upgrade, serve_socket, WebSocketConfig, WsTransport,
    };

    // Re-export configuration and telemetry entry points
    pub use switchboard_config::{ConfigLoader, SwitchboardConfig};
    pub use switchboard_telemetry::{init_telemetry, TelemetryConfig};
}
