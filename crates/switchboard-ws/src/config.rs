//! WebSocket configuration.
//!
//! This module defines the protocol limits applied to every accepted
//! WebSocket stream.

use tungstenite::protocol::WebSocketConfig as ProtocolConfig;

/// Configuration for a WebSocket stream.
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Maximum message size in bytes (default: 64 MB).
    pub max_message_size: usize,
    /// Maximum frame size in bytes (default: 16 MB).
    pub max_frame_size: usize,
    /// Write buffer size (default: 128 KB).
    pub write_buffer_size: usize,
    /// Read buffer size (default: 128 KB).
    pub read_buffer_size: usize,
    /// Whether to accept unmasked frames from clients (default: false).
    pub accept_unmasked_frames: bool,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_message_size: 64 * 1024 * 1024, // 64 MB
            max_frame_size: 16 * 1024 * 1024,   // 16 MB
            write_buffer_size: 128 * 1024,      // 128 KB
            read_buffer_size: 128 * 1024,       // 128 KB
            accept_unmasked_frames: false,
        }
    }
}

impl WebSocketConfig {
    /// Create a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum message size.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set the maximum frame size.
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Set the write buffer size.
    pub fn write_buffer_size(mut self, size: usize) -> Self {
        self.write_buffer_size = size;
        self
    }

    /// Set the read buffer size.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Set whether to accept unmasked frames from clients.
    pub fn accept_unmasked_frames(mut self, accept: bool) -> Self {
        self.accept_unmasked_frames = accept;
        self
    }

    /// Convert to the protocol configuration used by `tungstenite`.
    pub fn to_protocol(&self) -> ProtocolConfig {
        ProtocolConfig::default()
            .max_message_size(Some(self.max_message_size))
            .max_frame_size(Some(self.max_frame_size))
            .write_buffer_size(self.write_buffer_size)
            .read_buffer_size(self.read_buffer_size)
            .accept_unmasked_frames(self.accept_unmasked_frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_config_default() {
        let config = WebSocketConfig::default();
        assert_eq!(config.max_message_size, 64 * 1024 * 1024);
        assert_eq!(config.max_frame_size, 16 * 1024 * 1024);
        assert!(!config.accept_unmasked_frames);
    }

    #[test]
    fn test_websocket_config_builder() {
        let config = WebSocketConfig::new()
            .max_message_size(1024)
            .max_frame_size(512)
            .write_buffer_size(256)
            .read_buffer_size(256)
            .accept_unmasked_frames(true);

        assert_eq!(config.max_message_size, 1024);
        assert_eq!(config.max_frame_size, 512);
        assert_eq!(config.write_buffer_size, 256);
        assert!(config.accept_unmasked_frames);
    }

    #[test]
    fn test_to_protocol() {
        let protocol = WebSocketConfig::new()
            .max_message_size(1024)
            .max_frame_size(512)
            .to_protocol();

        assert_eq!(protocol.max_message_size, Some(1024));
        assert_eq!(protocol.max_frame_size, Some(512));
        assert!(!protocol.accept_unmasked_frames);
    }
}
