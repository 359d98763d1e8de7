//! Configuration schema types.
//!
//! Each section deserializes strictly and converts into the runtime config
//! type of the crate it configures.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use switchboard_core::{FrameKind, HubConfig};
use switchboard_telemetry::{LogConfig, MetricsConfig, TelemetryConfig};
use switchboard_ws::WebSocketConfig;

/// Frame kind used for heartbeats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HeartbeatKind {
    /// Ping frames.
    Ping,
    /// Pong frames.
    #[default]
    Pong,
}

impl From<HeartbeatKind> for FrameKind {
    fn from(kind: HeartbeatKind) -> Self {
        match kind {
            HeartbeatKind::Ping => FrameKind::Ping,
            HeartbeatKind::Pong => FrameKind::Pong,
        }
    }
}

/// Hub section.
///
/// # Example
///
/// ```
/// use switchboard_config::HubSection;
///
/// let section = HubSection {
///     heartbeat_interval_ms: 0,
///     ..Default::default()
/// };
/// assert!(section.to_hub_config().heartbeat_interval.is_zero());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HubSection {
    /// Length of generated connection ids.
    #[serde(default = "default_id_length")]
    pub id_length: usize,

    /// Attempts before id generation gives up.
    #[serde(default = "default_max_id_attempts")]
    pub max_id_attempts: usize,

    /// Capacity of each connection's outbound queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Heartbeat interval in milliseconds; zero disables heartbeats.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// Heartbeat frame kind.
    #[serde(default)]
    pub heartbeat_kind: HeartbeatKind,

    /// Maximum concurrently registered connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Reason sent with server-initiated close frames.
    #[serde(default = "default_close_reason")]
    pub close_reason: String,

    /// How long a close waits to queue its close frame, in milliseconds.
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
}

impl Default for HubSection {
    fn default() -> Self {
        Self {
            id_length: default_id_length(),
            max_id_attempts: default_max_id_attempts(),
            queue_capacity: default_queue_capacity(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            heartbeat_kind: HeartbeatKind::default(),
            max_connections: default_max_connections(),
            close_reason: default_close_reason(),
            close_timeout_ms: default_close_timeout_ms(),
        }
    }
}

impl HubSection {
    /// Convert into the hub's runtime configuration.
    #[must_use]
    pub fn to_hub_config(&self) -> HubConfig {
        HubConfig {
            id_length: self.id_length,
            max_id_attempts: self.max_id_attempts,
            queue_capacity: self.queue_capacity,
            heartbeat_interval: Duration::from_millis(self.heartbeat_interval_ms),
            heartbeat_kind: self.heartbeat_kind.into(),
            max_connections: self.max_connections,
            close_reason: self.close_reason.clone(),
            close_timeout: Duration::from_millis(self.close_timeout_ms),
        }
    }
}

fn default_id_length() -> usize {
    HubConfig::default().id_length
}

fn default_max_id_attempts() -> usize {
    HubConfig::default().max_id_attempts
}

fn default_queue_capacity() -> usize {
    HubConfig::default().queue_capacity
}

fn default_heartbeat_interval_ms() -> u64 {
    1000
}

fn default_max_connections() -> usize {
    HubConfig::default().max_connections
}

fn default_close_reason() -> String {
    HubConfig::default().close_reason
}

fn default_close_timeout_ms() -> u64 {
    5000
}

/// WebSocket protocol section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WebSocketSection {
    /// Largest accepted message, in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,

    /// Largest accepted frame, in bytes.
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,

    /// Write buffer size, in bytes.
    #[serde(default = "default_write_buffer_size")]
    pub write_buffer_size: usize,

    /// Read buffer size, in bytes.
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,

    /// Accept frames from clients that did not mask them.
    #[serde(default)]
    pub accept_unmasked_frames: bool,
}

impl Default for WebSocketSection {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
            max_frame_size: default_max_frame_size(),
            write_buffer_size: default_write_buffer_size(),
            read_buffer_size: default_read_buffer_size(),
            accept_unmasked_frames: false,
        }
    }
}

impl WebSocketSection {
    /// Convert into the WebSocket binding's configuration.
    #[must_use]
    pub fn to_websocket_config(&self) -> WebSocketConfig {
        WebSocketConfig::new()
            .max_message_size(self.max_message_size)
            .max_frame_size(self.max_frame_size)
            .write_buffer_size(self.write_buffer_size)
            .read_buffer_size(self.read_buffer_size)
            .accept_unmasked_frames(self.accept_unmasked_frames)
    }
}

fn default_max_message_size() -> usize {
    WebSocketConfig::default().max_message_size
}

fn default_max_frame_size() -> usize {
    WebSocketConfig::default().max_frame_size
}

fn default_write_buffer_size() -> usize {
    WebSocketConfig::default().write_buffer_size
}

fn default_read_buffer_size() -> usize {
    WebSocketConfig::default().read_buffer_size
}

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Install the Prometheus recorder.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Serve the scrape endpoint over HTTP.
    #[serde(default = "default_true")]
    pub listen: bool,

    /// Scrape endpoint address.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: true,
            addr: default_metrics_addr(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines.
    #[default]
    Json,
    /// Human-readable output.
    Pretty,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Install the log subscriber.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directives, e.g. `info,switchboard_core=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include file and line in log events.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telemetry section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Service name attached to logs and metrics.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Deployment environment.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            environment: default_environment(),
            metrics: MetricsSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

impl TelemetrySection {
    /// Convert into the telemetry crate's configuration.
    #[must_use]
    pub fn to_telemetry_config(&self) -> TelemetryConfig {
        let logging = match self.logging.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        let logging = LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            file_line_info: self.logging.include_location,
            ..logging
        };
        let metrics = MetricsConfig {
            enabled: self.metrics.enabled,
            listen: self.metrics.listen,
            addr: self.metrics.addr.clone(),
            ..MetricsConfig::default()
        };

        TelemetryConfig::builder()
            .service_name(&self.service_name)
            .environment(&self.environment)
            .metrics(metrics)
            .logging(logging)
            .build()
    }
}

fn default_service_name() -> String {
    "switchboard".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}
