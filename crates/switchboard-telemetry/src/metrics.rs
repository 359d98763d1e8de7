//! Prometheus metrics for Switchboard.
//!
//! `switchboard-core` records through the `metrics` facade. This module
//! installs the Prometheus recorder those calls land in and, optionally, the
//! HTTP listener that serves the scrape endpoint.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `switchboard_connections_active` | Gauge | - | Registered connections |
//! | `switchboard_connections_total` | Counter | - | Accepted connections |
//! | `switchboard_connections_rejected_total` | Counter | `reason` | Refused at admission |
//! | `switchboard_frames_received_total` | Counter | `kind` | Inbound frames |
//! | `switchboard_frames_sent_total` | Counter | `kind` | Outbound frames |
//! | `switchboard_fanout_failures_total` | Counter | `reason` | Undeliverable targets |
//!
//! # Example
//!
//! ```rust,ignore
//! use switchboard_telemetry::metrics::{init_metrics, render_metrics, MetricsConfig};
//!
//! init_metrics(&MetricsConfig::default())?;
//! println!("{}", render_metrics().unwrap_or_default());
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{describe_counter, describe_gauge, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use switchboard_core::metrics::{
    CONNECTIONS_ACTIVE, CONNECTIONS_REJECTED, CONNECTIONS_TOTAL, FANOUT_FAILURES, FRAMES_RECEIVED,
    FRAMES_SENT,
};

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Whether to serve the scrape endpoint over HTTP.
    ///
    /// When false the recorder is still installed and
    /// [`render_metrics`] can be used to expose metrics elsewhere.
    pub listen: bool,

    /// Address to expose metrics on (e.g., "0.0.0.0:9090").
    pub addr: String,

    /// Service name, attached to every metric as the `service` label.
    pub service_name: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: true,
            addr: "0.0.0.0:9090".to_string(),
            service_name: "switchboard".to_string(),
        }
    }
}

/// Initializes the metrics subsystem.
///
/// With `listen` set, the exporter is spawned onto the current Tokio runtime.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparsable address,
/// `TelemetryError::NoRuntime` when listening outside a runtime, and
/// `TelemetryError::MetricsInit` if a global recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let builder =
        PrometheusBuilder::new().add_global_label("service", config.service_name.clone());

    let handle = if config.listen {
        let addr: SocketAddr = config
            .addr
            .parse()
            .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| TelemetryError::NoRuntime)?;

        let (recorder, exporter) = builder
            .with_http_listener(addr)
            .build()
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        let handle = recorder.handle();
        metrics::set_global_recorder(recorder)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

        runtime.spawn(async move {
            if let Err(e) = exporter.await {
                tracing::error!(error = ?e, "Metrics exporter stopped");
            }
        });
        tracing::debug!(%addr, "Metrics endpoint listening");
        handle
    } else {
        builder
            .install_recorder()
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
    };

    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();

    Ok(())
}

/// Returns the global metrics handle if initialized.
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_gauge!(
        CONNECTIONS_ACTIVE,
        Unit::Count,
        "Number of connections currently registered with the hub"
    );
    describe_counter!(
        CONNECTIONS_TOTAL,
        Unit::Count,
        "Total number of connections accepted"
    );
    describe_counter!(
        CONNECTIONS_REJECTED,
        Unit::Count,
        "Total number of connections refused at admission"
    );
    describe_counter!(
        FRAMES_RECEIVED,
        Unit::Count,
        "Total number of frames read from transports"
    );
    describe_counter!(
        FRAMES_SENT,
        Unit::Count,
        "Total number of frames written to transports"
    );
    describe_counter!(
        FANOUT_FAILURES,
        Unit::Count,
        "Total number of fan-out targets that could not be delivered to"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert!(config.listen);
        assert_eq!(config.addr, "0.0.0.0:9090");
        assert_eq!(config.service_name, "switchboard");
    }

    #[test]
    fn test_disabled_metrics() {
        let config = MetricsConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_invalid_address() {
        let config = MetricsConfig {
            addr: "not-an-address".to_string(),
            ..Default::default()
        };
        let result = init_metrics(&config);
        assert!(matches!(result, Err(TelemetryError::InvalidAddress(_))));
    }

    #[test]
    fn test_listen_requires_runtime() {
        let config = MetricsConfig {
            addr: "127.0.0.1:0".to_string(),
            ..Default::default()
        };
        let result = init_metrics(&config);
        assert!(matches!(result, Err(TelemetryError::NoRuntime)));
    }
}
