//! Typed configuration for Switchboard.
//!
//! This crate loads a [`SwitchboardConfig`] from layered sources:
//! - TOML and JSON configuration files
//! - `.env` files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//!
//! Each section converts into the runtime type of the crate it configures:
//!
//! - [`HubSection`] → [`switchboard_core::HubConfig`]
//! - [`WebSocketSection`] → [`switchboard_ws::WebSocketConfig`]
//! - [`TelemetrySection`] → [`switchboard_telemetry::TelemetryConfig`]
//!
//! # Example
//!
//! ```no_run
//! use switchboard_config::ConfigLoader;
//!
//! # fn main() -> Result<(), switchboard_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("switchboard.toml")?
//!     .with_env_prefix("SWITCHBOARD")
//!     .load()?;
//!
//! let hub_config = config.hub.to_hub_config();
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [hub]
//! id_length = 100
//! max_id_attempts = 16
//! queue_capacity = 100
//! heartbeat_interval_ms = 1000
//! heartbeat_kind = "pong"
//! max_connections = 10000
//! close_reason = "Connection closed"
//! close_timeout_ms = 5000
//!
//! [websocket]
//! max_message_size = 67108864
//! max_frame_size = 16777216
//!
//! [telemetry]
//! service_name = "chat-gateway"
//! environment = "production"
//!
//! [telemetry.metrics]
//! enabled = true
//! listen = true
//! addr = "0.0.0.0:9090"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with variables of the form `PREFIX__SECTION__KEY`:
//!
//! - `SWITCHBOARD__HUB__QUEUE_CAPACITY=256`
//! - `SWITCHBOARD__HUB__HEARTBEAT_KIND=ping`
//! - `SWITCHBOARD__TELEMETRY__METRICS__ENABLED=false`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SwitchboardConfig::default();
        assert_eq!(config.hub.max_connections, 10_000);
        assert!(config.telemetry.metrics.enabled);
    }

    #[test]
    fn test_sections_convert() {
        let config = SwitchboardConfig::default();
        let hub = config.hub.to_hub_config();
        let telemetry = config.telemetry.to_telemetry_config();

        assert_eq!(hub.queue_capacity, 100);
        assert_eq!(telemetry.service_name, "switchboard");
    }
}
