//! Requester - issues calls and hands back awaitable replies.
//!
//! ```text
//! call(payload)
//!   ├─ CorrelationId::new()
//!   ├─ registry.register(id, now + timeout)
//!   ├─ transport.publish(request_channel, RequestEnvelope)   ── failure ──► Err(PublishFailed)
//!   ├─ spawn_timeout_guard(id, deadline, fallback)
//!   └─ PendingReply ◄── ReplyListener (reply channel) / guard (deadline)
//! ```

use crate::calls::CallType;
use crate::domain::config::CallConfig;
use crate::domain::error::BridgeError;
use crate::domain::policy::FallbackValue;
use crate::domain::registry::{CorrelationRegistry, RegistryStats};
use crate::domain::resolution::Resolution;
use crate::ipc::listener::ReplyListener;
use crate::ipc::pending::PendingReply;
use crate::ipc::timeout::spawn_timeout_guard;
use care_telemetry::metrics;
use shared_bus::Transport;
use shared_types::{CorrelationId, RequestEnvelope};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error};

/// Issues calls of one call type and matches their replies.
///
/// Owns the correlation registry for its call type and a reply listener task
/// subscribed to the configured reply channel. Dropping the requester stops
/// the listener; calls still pending then resolve through their fallback.
pub struct Requester<C: CallType> {
    transport: Arc<dyn Transport>,
    registry: Arc<CorrelationRegistry<C::Reply>>,
    config: CallConfig,
    fallback: C::Reply,
    listener: JoinHandle<()>,
    _call: PhantomData<fn() -> C>,
}

impl<C: CallType> Requester<C> {
    /// Create a requester and start its reply listener.
    ///
    /// Must be called from within a tokio runtime. Fails if the configuration
    /// is invalid, if the reply type has no value for the configured fallback
    /// policy, or if the reply channel cannot be subscribed.
    pub fn new(transport: Arc<dyn Transport>, config: CallConfig) -> Result<Self, BridgeError> {
        config.validate()?;

        let fallback = C::Reply::fallback_for(config.fallback).ok_or(
            BridgeError::UnsupportedPolicy {
                call_type: C::NAME,
                policy: config.fallback,
            },
        )?;

        // Subscribe before the first request goes out, so no reply is missed.
        let subscription = transport.subscribe(&config.reply_channel).map_err(|source| {
            BridgeError::SubscribeFailed {
                channel: config.reply_channel.clone(),
                source,
            }
        })?;

        let registry = Arc::new(CorrelationRegistry::new(C::NAME));
        let listener = tokio::spawn(ReplyListener::new(subscription, registry.clone()).run());

        debug!(
            call_type = C::NAME,
            request_channel = %config.request_channel,
            reply_channel = %config.reply_channel,
            timeout_ms = config.timeout.as_millis() as u64,
            fallback = %config.fallback,
            "Requester created"
        );

        Ok(Self {
            transport,
            registry,
            config,
            fallback,
            listener,
            _call: PhantomData,
        })
    }

    /// Create a requester with the call type's default configuration.
    pub fn with_defaults(transport: Arc<dyn Transport>) -> Result<Self, BridgeError> {
        Self::new(transport, C::default_config())
    }

    /// Publish a request and return a handle resolving to its outcome.
    ///
    /// Returns an error only if the deadline cannot be represented or the
    /// request could not be encoded or published; in that case nothing stays registered and no timeout is
    /// scheduled. At most one request is published per call.
    pub async fn call(&self, payload: C::Request) -> Result<PendingReply<C::Reply>, BridgeError> {
        let correlation_id = CorrelationId::new();
        let deadline = Instant::now()
            .checked_add(self.config.timeout)
            .ok_or(BridgeError::InvalidTimeout)?;

        let message =
            RequestEnvelope::new(correlation_id, self.config.reply_channel.as_str(), payload)
                .encode()?;

        let receiver = self.registry.register(correlation_id, deadline)?;
        // Dropping this (publish failure, or the caller abandoning `call`
        // mid-publish) discards the registry entry.
        let mut pending = PendingReply::new(
            correlation_id,
            deadline,
            receiver,
            self.registry.clone(),
            self.fallback.clone(),
        );

        metrics::CALLS_TOTAL.with_label_values(&[C::NAME]).inc();

        if let Err(source) = self
            .transport
            .publish(&self.config.request_channel, message)
            .await
        {
            drop(pending);
            metrics::PUBLISH_FAILURES_TOTAL
                .with_label_values(&[C::NAME])
                .inc();
            error!(
                correlation_id = %correlation_id,
                call_type = C::NAME,
                channel = %self.config.request_channel,
                error = %source,
                "Failed to publish request"
            );
            return Err(BridgeError::PublishFailed {
                channel: self.config.request_channel.clone(),
                source,
            });
        }

        pending.arm(spawn_timeout_guard(
            self.registry.clone(),
            correlation_id,
            deadline,
            self.fallback.clone(),
        ));

        debug!(
            correlation_id = %correlation_id,
            call_type = C::NAME,
            channel = %self.config.request_channel,
            "Request published"
        );

        Ok(pending)
    }

    /// Call and wait, collapsing the resolution to its value.
    ///
    /// A fallback value is indistinguishable from a real answer here; use
    /// [`Requester::call`] and [`Resolution::is_fallback`] when it matters.
    pub async fn request(&self, payload: C::Request) -> Result<C::Reply, BridgeError> {
        Ok(self.call_and_wait(payload).await?.into_value())
    }

    /// Call and wait, keeping the origin of the value.
    pub async fn call_and_wait(
        &self,
        payload: C::Request,
    ) -> Result<Resolution<C::Reply>, BridgeError> {
        Ok(self.call(payload).await?.await)
    }

    /// Configuration in use.
    pub fn config(&self) -> &CallConfig {
        &self.config
    }

    /// Number of calls waiting for a reply or a timeout.
    pub fn pending_count(&self) -> usize {
        self.registry.pending_count()
    }

    /// Whether a call is still waiting.
    pub fn is_pending(&self, correlation_id: &CorrelationId) -> bool {
        self.registry.is_pending(correlation_id)
    }

    /// Registry statistics.
    pub fn stats(&self) -> &RegistryStats {
        self.registry.stats()
    }
}

impl<C: CallType> Drop for Requester<C> {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
