//! # Runtime Configuration
//!
//! Everything the binary needs, loaded from environment variables with sane
//! defaults.

use care_bridge::BridgeConfig;
use care_telemetry::TelemetryConfig;
use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use std::time::Duration;
use tracing::warn;

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Per-channel buffer of the in-memory bus.
    pub bus_capacity: usize,
    /// How long shutdown waits for responders to drain.
    pub shutdown_grace: Duration,
    /// Interval between bridge status log lines.
    pub status_interval: Duration,
    /// Run one call of each type at startup.
    pub self_check: bool,
    /// Channels, timeouts and fallbacks per call type.
    pub bridge: BridgeConfig,
    /// Logging configuration.
    pub telemetry: TelemetryConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bus_capacity: DEFAULT_CHANNEL_CAPACITY,
            shutdown_grace: Duration::from_secs(2),
            status_interval: Duration::from_secs(60),
            self_check: true,
            bridge: BridgeConfig::default(),
            telemetry: TelemetryConfig::for_service("care-runtime"),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `CARE_BUS_CAPACITY`: messages buffered per channel (default: 1000)
    /// - `CARE_SHUTDOWN_GRACE_MS`: shutdown drain time (default: 2000)
    /// - `CARE_STATUS_INTERVAL_SECS`: status log interval (default: 60)
    /// - `CARE_SELF_CHECK`: run the startup self-check (default: true)
    /// - bridge and telemetry variables, see `BridgeConfig::from_env` and
    ///   `TelemetryConfig::from_env`
    pub fn from_env() -> Self {
        let mut config = Self {
            bridge: BridgeConfig::from_env(),
            telemetry: TelemetryConfig::from_env(),
            ..Self::default()
        };
        if std::env::var("CARE_SERVICE_NAME").is_err() {
            config.telemetry.service_name = "care-runtime".to_string();
        }

        if let Some(capacity) = parse_var::<usize>("CARE_BUS_CAPACITY") {
            if capacity > 0 {
                config.bus_capacity = capacity;
            } else {
                warn!("CARE_BUS_CAPACITY must be greater than zero");
            }
        }
        if let Some(ms) = parse_var::<u64>("CARE_SHUTDOWN_GRACE_MS") {
            config.shutdown_grace = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>("CARE_STATUS_INTERVAL_SECS") {
            if secs > 0 {
                config.status_interval = Duration::from_secs(secs);
            }
        }
        if let Ok(value) = std::env::var("CARE_SELF_CHECK") {
            config.self_check = value.to_lowercase() != "false" && value != "0";
        }

        config
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let value = std::env::var(name).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(var = name, value = %value, "Ignoring unparseable environment variable");
            None
        }
    }
}
