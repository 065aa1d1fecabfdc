//! # Care Telemetry
//!
//! Logging and Prometheus metrics for the request/reply bridge.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use care_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CARE_SERVICE_NAME` | `care-bridge` | Service name in logs |
//! | `CARE_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `CARE_JSON_LOGS` | `false` | JSON log lines (default `true` in containers) |
//! | `CARE_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, service_span};
pub use metrics::{encode_metrics, register_metrics};

use thiserror::Error;

/// Telemetry initialization errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    Init(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)?;
    register_metrics()?;
    Ok(())
}
