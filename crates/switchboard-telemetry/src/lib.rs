//! Observability setup for Switchboard.
//!
//! `switchboard-core` only talks to the `tracing` and `metrics` facades. This
//! crate installs what sits behind them:
//!
//! - **Logging**: structured JSON or pretty output via `tracing-subscriber`
//! - **Metrics**: a Prometheus recorder with an optional scrape endpoint
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                switchboard-core               │
//! │   tracing::debug!(..)      counter!(..)       │
//! └──────────┬───────────────────────┬───────────┘
//!            │                       │
//! ┌──────────┼───────────────────────┼───────────┐
//! │          ▼  switchboard-telemetry ▼           │
//! │  ┌───────────────┐     ┌─────────────────┐   │
//! │  │    Logging    │     │     Metrics     │   │
//! │  │ (subscriber)  │     │  (Prometheus)   │   │
//! │  └───────┬───────┘     └────────┬────────┘   │
//! └──────────┼──────────────────────┼────────────┘
//!            ▼                      ▼
//!      ┌──────────┐          ┌──────────┐
//!      │ stdout/  │          │ /metrics │
//!      │  stderr  │          │          │
//!      └──────────┘          └──────────┘
//! ```
//!
//! See [`metrics`] for the list of exported metrics.
//!
//! # Example
//!
//! ```rust,ignore
//! use switchboard_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::builder()
//!         .service_name("chat-gateway")
//!         .environment("production")
//!         .metrics_addr("0.0.0.0:9090")
//!         .build();
//!
//!     init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{get_metrics_handle, init_metrics, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// Both install process-wide state, so this succeeds at most once per
/// process.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        "Telemetry initialized"
    );
    Ok(())
}
