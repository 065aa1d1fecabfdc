//! # Care Runtime
//!
//! Runs the bridge in one process: an in-memory bus, the user-existence,
//! announcement-owner and application-verification responders, and the
//! requesters that call them.
//!
//! Configuration comes from `CARE_*` environment variables (see
//! `RuntimeConfig::from_env`). Stop with Ctrl+C.

use anyhow::{Context, Result};
use care_runtime::{CareRuntime, RuntimeConfig, Stores};
use tracing::{debug, info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env();

    // Initialize logging and metrics
    care_telemetry::init_telemetry(&config.telemetry).context("failed to initialize telemetry")?;

    let span = care_telemetry::service_span(&config.telemetry);
    run(config).instrument(span).await
}

async fn run(config: RuntimeConfig) -> Result<()> {
    let runtime = CareRuntime::start(config.clone(), Stores::seeded()).await?;

    if config.self_check {
        runtime.self_check().await?;
    }

    // Keep the runtime running
    info!("Care runtime is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    // Graceful shutdown
    runtime.shutdown().await;

    match care_telemetry::encode_metrics() {
        Ok(metrics) => debug!(metrics = %metrics, "Final bridge metrics"),
        Err(e) => warn!(error = %e, "Failed to encode metrics"),
    }

    Ok(())
}
