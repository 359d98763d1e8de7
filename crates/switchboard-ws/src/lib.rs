//! WebSocket transport for Switchboard.
//!
//! This crate binds `tokio-tungstenite` streams to the
//! [`Transport`](switchboard_core::Transport) capability so upgraded sockets
//! can be accepted into a [`Hub`](switchboard_core::Hub).
//!
//! # Example
//!
//! ```ignore
//! use switchboard_core::{Hub, HubConfig, RequestContext};
//! use switchboard_ws::{serve_socket, WebSocketConfig};
//!
//! let hub = Hub::new(HubConfig::default());
//! let config = WebSocketConfig::default();
//!
//! // After the host framework has upgraded the request:
//! serve_socket(&hub, upgraded, &config, RequestContext::new(), |conn| {
//!     conn.set_attribute("user", "alice");
//! })
//! .await?;
//! ```
//!
//! # Message Mapping
//!
//! | Frame kind | `tungstenite::Message` |
//! |------------|------------------------|
//! | Text       | `Text`                 |
//! | Binary     | `Binary`               |
//! | Ping       | `Ping`                 |
//! | Pong       | `Pong`                 |
//! | Close      | `Close` (code, reason) |
//!
//! A stream that ends without a close frame reads as
//! [`TransportError::Closed`](switchboard_core::TransportError::Closed).

pub mod config;
pub mod message;
pub mod transport;
pub mod upgrade;

// Re-exports for convenience
pub use config::WebSocketConfig;
pub use message::{from_message, to_message};
pub use transport::{transport_error, WsTransport};
pub use upgrade::{accept_handshake, complete_upgrade, serve_socket};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exports() {
        let _config = WebSocketConfig::default();
        let _message = to_message(switchboard_core::Frame::text("hello"));
    }
}
