//! Main configuration types.
//!
//! This module provides the top-level [`SwitchboardConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, HubSection, LogFormat, TelemetrySection, WebSocketSection};

/// Complete Switchboard configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use switchboard_config::SwitchboardConfig;
///
/// let config = SwitchboardConfig::default();
/// assert_eq!(config.hub.queue_capacity, 100);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct SwitchboardConfig {
    /// Hub configuration.
    #[serde(default)]
    pub hub: HubSection,

    /// WebSocket protocol limits.
    #[serde(default)]
    pub websocket: WebSocketSection,

    /// Telemetry configuration (metrics, logging).
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

impl SwitchboardConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> SwitchboardConfigBuilder {
        SwitchboardConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - A hub size or count is zero
    /// - The metrics address does not parse while the listener is enabled
    /// - The log level is not a valid filter
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero = [
            ("hub.id_length", self.hub.id_length),
            ("hub.max_id_attempts", self.hub.max_id_attempts),
            ("hub.queue_capacity", self.hub.queue_capacity),
            ("hub.max_connections", self.hub.max_connections),
            ("websocket.max_frame_size", self.websocket.max_frame_size),
        ];
        for (field, value) in nonzero {
            if value == 0 {
                return Err(ConfigError::invalid_value(
                    field,
                    "must be greater than zero",
                ));
            }
        }

        if self.websocket.max_frame_size > self.websocket.max_message_size {
            return Err(ConfigError::invalid_value(
                "websocket.max_frame_size",
                "must not exceed websocket.max_message_size",
            ));
        }

        let metrics = &self.telemetry.metrics;
        if metrics.enabled
            && metrics.listen
            && metrics.addr.parse::<std::net::SocketAddr>().is_err()
        {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.addr",
                format!("invalid socket address: {}", metrics.addr),
            ));
        }

        if let Err(e) =
            switchboard_telemetry::logging::create_env_filter(&self.telemetry.logging.level)
        {
            return Err(ConfigError::invalid_value(
                "telemetry.logging.level",
                e.to_string(),
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty debug logging with source locations and no metrics listener.
    ///
    /// # Example
    ///
    /// ```
    /// use switchboard_config::SwitchboardConfig;
    ///
    /// let config = SwitchboardConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.include_location = true;
        config.telemetry.metrics.listen = false;
        config.telemetry.environment = "development".to_string();

        config
    }

    /// Create a production configuration preset.
    ///
    /// JSON info logging and the metrics listener enabled.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.metrics.enabled = true;
        config.telemetry.metrics.listen = true;
        config.telemetry.environment = "production".to_string();

        config
    }
}

/// Builder for [`SwitchboardConfig`].
#[derive(Debug, Default)]
pub struct SwitchboardConfigBuilder {
    hub: Option<HubSection>,
    websocket: Option<WebSocketSection>,
    telemetry: Option<TelemetrySection>,
}

impl SwitchboardConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hub configuration.
    #[must_use]
    pub fn hub(mut self, hub: HubSection) -> Self {
        self.hub = Some(hub);
        self
    }

    /// Set the WebSocket configuration.
    #[must_use]
    pub fn websocket(mut self, websocket: WebSocketSection) -> Self {
        self.websocket = Some(websocket);
        self
    }

    /// Set the telemetry configuration.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetrySection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> SwitchboardConfig {
        SwitchboardConfig {
            hub: self.hub.unwrap_or_default(),
            websocket: self.websocket.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<SwitchboardConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LoggingSection, MetricsSection};

    #[test]
    fn test_default_config() {
        let config = SwitchboardConfig::default();
        assert_eq!(config.hub.id_length, 100);
        assert_eq!(config.hub.heartbeat_interval_ms, 1000);
        assert_eq!(config.telemetry.service_name, "switchboard");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_sections() {
        let config = SwitchboardConfig::builder()
            .hub(HubSection {
                max_connections: 5,
                ..Default::default()
            })
            .build();

        assert_eq!(config.hub.max_connections, 5);
        assert_eq!(config.websocket, WebSocketSection::default());
    }

    #[test]
    fn test_validate_zero_queue_capacity() {
        let result = SwitchboardConfig::builder()
            .hub(HubSection {
                queue_capacity: 0,
                ..Default::default()
            })
            .build_validated();

        assert!(result.unwrap_err().to_string().contains("hub.queue_capacity"));
    }

    #[test]
    fn test_validate_frame_larger_than_message() {
        let result = SwitchboardConfig::builder()
            .websocket(WebSocketSection {
                max_message_size: 1024,
                max_frame_size: 4096,
                ..Default::default()
            })
            .build_validated();

        assert!(result.unwrap_err().to_string().contains("max_frame_size"));
    }

    #[test]
    fn test_validate_invalid_metrics_addr() {
        let mut telemetry = TelemetrySection::default();
        telemetry.metrics = MetricsSection {
            addr: "invalid".to_string(),
            ..Default::default()
        };
        let config = SwitchboardConfig::builder().telemetry(telemetry).build();

        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("metrics.addr"));
    }

    #[test]
    fn test_metrics_addr_ignored_without_listener() {
        let mut telemetry = TelemetrySection::default();
        telemetry.metrics = MetricsSection {
            listen: false,
            addr: "invalid".to_string(),
            ..Default::default()
        };
        let config = SwitchboardConfig::builder().telemetry(telemetry).build();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut telemetry = TelemetrySection::default();
        telemetry.logging = LoggingSection {
            level: "switchboard_core=loud".to_string(),
            ..Default::default()
        };
        let result = SwitchboardConfig::builder()
            .telemetry(telemetry)
            .build_validated();

        assert!(result.unwrap_err().to_string().contains("logging.level"));
    }

    #[test]
    fn test_presets() {
        let dev = SwitchboardConfig::development();
        assert_eq!(dev.telemetry.logging.format, LogFormat::Pretty);
        assert!(!dev.telemetry.metrics.listen);
        assert!(dev.validate().is_ok());

        let prod = SwitchboardConfig::production();
        assert_eq!(prod.telemetry.logging.format, LogFormat::Json);
        assert_eq!(prod.telemetry.environment, "production");
        assert!(prod.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip_sections() {
        let toml_str = toml::to_string_pretty(&SwitchboardConfig::default()).unwrap();
        assert!(toml_str.contains("[hub]"));
        assert!(toml_str.contains("[websocket]"));
        assert!(toml_str.contains("[telemetry.metrics]"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml_str = r#"
            [hub]
            id_length = 32
            max_rooms = 4
        "#;

        let result: Result<SwitchboardConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }
}
