//! Structured logging setup.
//!
//! Logs go to stdout either as JSON (one object per line, for log shippers)
//! or in the human-readable fmt format. Every line carries the target module
//! so bridge events can be filtered per component, e.g.
//! `CARE_LOG_LEVEL=info,care_bridge::listener=debug`.

use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::{TelemetryConfig, TelemetryError};

/// Initialize the global tracing subscriber.
///
/// Fails with `TelemetryError::Init` if a global subscriber is already set.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("invalid log level '{}': {e}", config.log_level)))?;

    let fmt_layer: Option<Box<dyn Layer<Registry> + Send + Sync>> = if !config.console_output {
        None
    } else if config.json_logs {
        // JSON output for containers/production
        Some(
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
        )
    } else {
        // Pretty output for development
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(true)
                .boxed(),
        )
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        log_level = %config.log_level,
        json_logs = config.json_logs,
        "Logging initialized"
    );

    Ok(())
}

/// Root span carrying the service name.
///
/// Events emitted inside it, directly or through instrumented futures, are
/// tagged with `service`.
pub fn service_span(config: &TelemetryConfig) -> Span {
    tracing::info_span!("service", service = %config.service_name)
}
