//! # Care Runtime
//!
//! Wires the bus, the responders and the requesters into one process.
//!
//! ## Startup Sequence
//!
//! 1. Create the in-memory bus
//! 2. Start the three responders (subscribed before anything is published)
//! 3. Create the requesters (each subscribes its reply channel)
//! 4. Start the status reporter
//!
//! ## Shutdown Sequence
//!
//! 1. Signal shutdown to background tasks
//! 2. Close the bus, ending every subscription
//! 3. Wait up to the grace period for responders to finish

use crate::clients::BridgeClients;
use crate::config::RuntimeConfig;
use crate::handlers::{
    AnnouncementOwnerHandler, ApplicationVerificationHandler, UserExistsHandler,
};
use crate::stores::Stores;
use anyhow::{Context, Result};
use care_bridge::{AnnouncementOwner, ApplicationVerification, Responder, UserExists};
use shared_bus::{InMemoryBus, Transport};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Outcome of the startup self-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfCheckReport {
    pub user_exists: bool,
    pub announcement_owner: Option<String>,
    pub application_accepted: bool,
    /// Number of the three calls answered by the fallback instead of a reply.
    pub fallbacks: usize,
}

/// A running single-process bridge deployment.
pub struct CareRuntime {
    config: RuntimeConfig,
    bus: Arc<InMemoryBus>,
    stores: Arc<Stores>,
    clients: Arc<BridgeClients>,
    tasks: Vec<JoinHandle<()>>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
}

impl CareRuntime {
    /// Start responders, requesters and background tasks.
    pub async fn start(config: RuntimeConfig, stores: Stores) -> Result<Self> {
        info!(
            bus_capacity = config.bus_capacity,
            "Starting care runtime"
        );

        config
            .bridge
            .validate()
            .context("invalid bridge configuration")?;

        let bus = Arc::new(InMemoryBus::with_capacity(config.bus_capacity));
        let transport: Arc<dyn Transport> = bus.clone();
        let stores = Arc::new(stores);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut tasks = Vec::new();

        tasks.push(
            Responder::<UserExists>::new(
                transport.clone(),
                config.bridge.user_exists.request_channel.clone(),
                UserExistsHandler::new(stores.clone()),
            )?
            .spawn()
            .context("failed to start user-exists responder")?,
        );
        tasks.push(
            Responder::<AnnouncementOwner>::new(
                transport.clone(),
                config.bridge.announcement_owner.request_channel.clone(),
                AnnouncementOwnerHandler::new(stores.clone()),
            )?
            .spawn()
            .context("failed to start announcement-owner responder")?,
        );
        tasks.push(
            Responder::<ApplicationVerification>::new(
                transport.clone(),
                config.bridge.application_verification.request_channel.clone(),
                ApplicationVerificationHandler::new(stores.clone()),
            )?
            .spawn()
            .context("failed to start application-verification responder")?,
        );
        info!("Responders started");

        let clients = Arc::new(
            BridgeClients::connect(transport, &config.bridge)
                .context("failed to create requesters")?,
        );
        info!("Requesters ready");

        tasks.push(spawn_status_reporter(
            bus.clone(),
            clients.clone(),
            config.status_interval,
            shutdown_rx,
        ));

        Ok(Self {
            config,
            bus,
            stores,
            clients,
            tasks,
            shutdown_tx,
        })
    }

    /// Issue one call of each type against the seeded data.
    pub async fn self_check(&self) -> Result<SelfCheckReport> {
        let user = self
            .clients
            .user_exists
            .call_and_wait("alice".to_string())
            .await
            .context("user-exists self-check failed")?;
        let owner = self
            .clients
            .announcement_owner
            .call_and_wait(1)
            .await
            .context("announcement-owner self-check failed")?;
        let accepted = self
            .clients
            .application_verification
            .call_and_wait(care_bridge::AcceptanceQuery::new("bob", 1))
            .await
            .context("application-verification self-check failed")?;

        let fallbacks = [user.is_fallback(), owner.is_fallback(), accepted.is_fallback()]
            .iter()
            .filter(|fallback| **fallback)
            .count();

        let report = SelfCheckReport {
            user_exists: user.into_value(),
            announcement_owner: owner.into_value(),
            application_accepted: accepted.into_value(),
            fallbacks,
        };

        if report.fallbacks == 0 {
            info!(?report, "Self-check passed");
        } else {
            warn!(?report, "Self-check resolved through fallbacks");
        }
        Ok(report)
    }

    /// The requesters, for callers embedding the runtime.
    pub fn clients(&self) -> Arc<BridgeClients> {
        Arc::clone(&self.clients)
    }

    /// The lookup stores the responders answer from.
    pub fn stores(&self) -> Arc<Stores> {
        Arc::clone(&self.stores)
    }

    /// The bus everything runs on.
    pub fn bus(&self) -> Arc<InMemoryBus> {
        Arc::clone(&self.bus)
    }

    /// Shutdown the runtime gracefully.
    pub async fn shutdown(self) {
        let Self {
            config,
            bus,
            clients,
            tasks,
            shutdown_tx,
            ..
        } = self;
        info!("Initiating graceful shutdown...");

        // Signal all background tasks to stop
        if let Err(e) = shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        bus.close();

        let grace = config.shutdown_grace;
        let drained = tokio::time::timeout(grace, async move {
            for task in tasks {
                if let Err(e) = task.await {
                    warn!(error = %e, "Background task ended abnormally");
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(grace_ms = grace.as_millis() as u64, "Shutdown grace period elapsed");
        }

        info!(
            pending_calls = clients.pending_calls(),
            "Shutdown complete"
        );
    }
}

/// Periodically log bus and bridge counters until shutdown.
fn spawn_status_reporter(
    bus: Arc<InMemoryBus>,
    clients: Arc<BridgeClients>,
    interval: std::time::Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    info!(
                        messages_published = bus.messages_published(),
                        pending_calls = clients.pending_calls(),
                        "Bridge status"
                    );
                }
                _ = shutdown.changed() => {
                    info!("Status reporter shutdown signal received");
                    break;
                }
            }
        }
    })
}
