//! Reply Listener - routes replies to the pending calls awaiting them.

use crate::domain::registry::CorrelationRegistry;
use care_telemetry::metrics::{self, ROLE_REQUESTER};
use serde::de::DeserializeOwned;
use shared_bus::Subscription;
use shared_types::ReplyEnvelope;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Consumes one reply channel and resolves matching calls in the registry.
///
/// Replies that match nothing (late, duplicated, or meant for another
/// requester sharing the channel) are dropped. Replies that fail to decode
/// are dropped without touching any pending call.
pub struct ReplyListener<R> {
    subscription: Subscription,
    registry: Arc<CorrelationRegistry<R>>,
}

impl<R> ReplyListener<R>
where
    R: DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(subscription: Subscription, registry: Arc<CorrelationRegistry<R>>) -> Self {
        Self {
            subscription,
            registry,
        }
    }

    /// Run the listener loop until the subscription ends.
    pub async fn run(mut self) {
        info!(
            channel = self.subscription.channel(),
            call_type = self.registry.call_type(),
            "Reply listener started"
        );

        while let Some(message) = self.subscription.recv().await {
            self.handle_reply(&message);
        }

        info!(
            channel = self.subscription.channel(),
            call_type = self.registry.call_type(),
            "Reply listener stopped"
        );
    }

    fn handle_reply(&self, message: &[u8]) {
        let call_type = self.registry.call_type();

        let envelope = match ReplyEnvelope::<R>::decode(message) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(
                    channel = self.subscription.channel(),
                    call_type,
                    error = %e,
                    "Dropping malformed reply"
                );
                metrics::MALFORMED_MESSAGES_TOTAL
                    .with_label_values(&[call_type, ROLE_REQUESTER])
                    .inc();
                return;
            }
        };

        let correlation_id = envelope.correlation_id;
        if !self.registry.resolve(&correlation_id, envelope.payload) {
            debug!(
                correlation_id = %correlation_id,
                call_type,
                "Reply for unknown or expired correlation ID"
            );
            metrics::UNMATCHED_REPLIES_TOTAL
                .with_label_values(&[call_type])
                .inc();
        }
    }
}
