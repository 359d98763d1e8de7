//! Hub configuration.
//!
//! This module defines the tunables for id generation, the outbound queue,
//! heartbeats and admission.

use std::time::Duration;

use crate::frame::FrameKind;

/// Configuration for a [`Hub`](crate::Hub) and the connections it runs.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Length of generated connection ids (default: 100).
    pub id_length: usize,
    /// Attempts before id generation gives up (default: 16).
    pub max_id_attempts: usize,
    /// Capacity of each connection's outbound queue (default: 100).
    pub queue_capacity: usize,
    /// Interval between heartbeat frames (default: 1 second).
    pub heartbeat_interval: Duration,
    /// Kind of heartbeat frame, ping or pong (default: pong).
    pub heartbeat_kind: FrameKind,
    /// Maximum concurrently registered connections (default: 10000).
    pub max_connections: usize,
    /// Reason sent in the close frame of a server-initiated close.
    pub close_reason: String,
    /// How long a server-initiated close waits for queue space before the
    /// connection is dropped without a close frame (default: 5 seconds).
    pub close_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            id_length: 100,
            max_id_attempts: 16,
            queue_capacity: 100,
            heartbeat_interval: Duration::from_secs(1),
            heartbeat_kind: FrameKind::Pong,
            max_connections: 10_000,
            close_reason: "Connection closed".to_string(),
            close_timeout: Duration::from_secs(5),
        }
    }
}

impl HubConfig {
    /// Create a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the generated id length.
    pub fn id_length(mut self, length: usize) -> Self {
        self.id_length = length;
        self
    }

    /// Set the id generation retry budget.
    pub fn max_id_attempts(mut self, attempts: usize) -> Self {
        self.max_id_attempts = attempts;
        self
    }

    /// Set the outbound queue capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the heartbeat interval.
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Send ping frames as heartbeats instead of pongs.
    pub fn heartbeat_ping(mut self) -> Self {
        self.heartbeat_kind = FrameKind::Ping;
        self
    }

    /// Set the maximum number of connections.
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the close frame reason.
    pub fn close_reason(mut self, reason: impl Into<String>) -> Self {
        self.close_reason = reason.into();
        self
    }

    /// Set how long a close waits to queue its close frame.
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_config_default() {
        let config = HubConfig::default();
        assert_eq!(config.id_length, 100);
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(1));
        assert_eq!(config.heartbeat_kind, FrameKind::Pong);
        assert_eq!(config.max_connections, 10_000);
        assert_eq!(config.close_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_hub_config_builder() {
        let config = HubConfig::new()
            .id_length(16)
            .max_id_attempts(4)
            .queue_capacity(8)
            .heartbeat_interval(Duration::from_millis(250))
            .heartbeat_ping()
            .max_connections(3)
            .close_reason("bye")
            .close_timeout(Duration::from_millis(50));

        assert_eq!(config.id_length, 16);
        assert_eq!(config.max_id_attempts, 4);
        assert_eq!(config.queue_capacity, 8);
        assert_eq!(config.heartbeat_interval, Duration::from_millis(250));
        assert_eq!(config.heartbeat_kind, FrameKind::Ping);
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.close_reason, "bye");
        assert_eq!(config.close_timeout, Duration::from_millis(50));
    }
}
