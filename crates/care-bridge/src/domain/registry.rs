//! Correlation Registry - the table of outstanding calls.
//!
//! Maps correlation IDs to the resolver slot a caller is awaiting.
//!
//! Flow:
//! 1. Requester generates a CorrelationId and calls `register()`
//! 2. Requester publishes the request
//! 3. Reply listener receives the reply and calls `resolve()`
//! 4. Or the timeout guard fires first and calls `evict_if_pending()`
//!
//! Every terminal operation removes the entry before touching its resolver.
//! `DashMap::remove` is atomic per entry, so whichever of `resolve` and
//! `evict_if_pending` removes the entry fulfills it, and the other is a no-op.

use crate::domain::error::RegistryError;
use crate::domain::resolution::Resolution;
use care_telemetry::metrics;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shared_types::CorrelationId;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::debug;

/// A call waiting for its reply or its deadline.
struct PendingCall<R> {
    /// Single-assignment slot the caller awaits
    resolver: oneshot::Sender<Resolution<R>>,
    /// When the call was registered
    created_at: Instant,
    /// When the timeout guard will evict it
    deadline: Instant,
}

/// Statistics for a correlation registry
#[derive(Debug, Default)]
pub struct RegistryStats {
    /// Total calls registered
    pub registered: AtomicU64,
    /// Calls resolved by a matched reply
    pub resolved_by_reply: AtomicU64,
    /// Calls resolved by the fallback at their deadline
    pub resolved_by_timeout: AtomicU64,
    /// Calls removed without resolution (publish failure, caller gave up)
    pub abandoned: AtomicU64,
    /// Registrations rejected because the id was already pending
    pub duplicates_rejected: AtomicU64,
}

/// In-memory, thread-safe registry of pending calls for one call type.
pub struct CorrelationRegistry<R> {
    /// Map of correlation ID to pending call
    pending: DashMap<CorrelationId, PendingCall<R>>,
    /// Label for logs and metrics
    call_type: &'static str,
    /// Statistics
    stats: RegistryStats,
}

impl<R> CorrelationRegistry<R> {
    /// Create an empty registry.
    pub fn new(call_type: &'static str) -> Self {
        Self {
            pending: DashMap::new(),
            call_type,
            stats: RegistryStats::default(),
        }
    }

    /// Register a pending call and get the receiver its resolution will arrive on.
    pub fn register(
        &self,
        correlation_id: CorrelationId,
        deadline: Instant,
    ) -> Result<oneshot::Receiver<Resolution<R>>, RegistryError> {
        match self.pending.entry(correlation_id) {
            Entry::Occupied(_) => {
                self.stats.duplicates_rejected.fetch_add(1, Ordering::Relaxed);
                Err(RegistryError::DuplicateCorrelationId(correlation_id))
            }
            Entry::Vacant(slot) => {
                let (resolver, receiver) = oneshot::channel();
                slot.insert(PendingCall {
                    resolver,
                    created_at: Instant::now(),
                    deadline,
                });
                self.stats.registered.fetch_add(1, Ordering::Relaxed);
                metrics::PENDING_CALLS
                    .with_label_values(&[self.call_type])
                    .inc();

                debug!(
                    correlation_id = %correlation_id,
                    call_type = self.call_type,
                    "Registered pending call"
                );
                Ok(receiver)
            }
        }
    }

    /// Resolve a pending call with a reply payload.
    ///
    /// Returns false, with no side effect, if the call is not pending (already
    /// resolved, timed out, or never registered here).
    pub fn resolve(&self, correlation_id: &CorrelationId, payload: R) -> bool {
        let Some(call) = self.take(correlation_id) else {
            return false;
        };
        let elapsed = call.created_at.elapsed();

        self.stats.resolved_by_reply.fetch_add(1, Ordering::Relaxed);
        metrics::observe_reply(self.call_type, elapsed);
        self.fulfill(correlation_id, call, Resolution::Reply(payload));

        debug!(
            correlation_id = %correlation_id,
            call_type = self.call_type,
            elapsed_ms = elapsed.as_millis() as u64,
            "Resolved pending call with reply"
        );
        true
    }

    /// Resolve a call with its fallback payload, only if it is still pending.
    ///
    /// Returns false if a reply got there first.
    pub fn evict_if_pending(&self, correlation_id: &CorrelationId, fallback: R) -> bool {
        let Some(call) = self.take(correlation_id) else {
            return false;
        };
        let elapsed = call.created_at.elapsed();

        self.stats.resolved_by_timeout.fetch_add(1, Ordering::Relaxed);
        metrics::observe_timeout(self.call_type, elapsed);
        self.fulfill(correlation_id, call, Resolution::Fallback(fallback));
        true
    }

    /// Remove a pending call without resolving it.
    ///
    /// Used when the request never made it onto the bus, or the caller
    /// stopped waiting. Returns false if the call was not pending.
    pub fn discard(&self, correlation_id: &CorrelationId) -> bool {
        if self.take(correlation_id).is_none() {
            return false;
        }
        self.stats.abandoned.fetch_add(1, Ordering::Relaxed);
        debug!(
            correlation_id = %correlation_id,
            call_type = self.call_type,
            "Discarded pending call"
        );
        true
    }

    /// Get number of currently pending calls
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Check if a correlation ID is pending
    pub fn is_pending(&self, correlation_id: &CorrelationId) -> bool {
        self.pending.contains_key(correlation_id)
    }

    /// Deadline of a pending call
    pub fn deadline(&self, correlation_id: &CorrelationId) -> Option<Instant> {
        self.pending.get(correlation_id).map(|call| call.deadline)
    }

    /// Get statistics
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    /// Call type label
    pub fn call_type(&self) -> &'static str {
        self.call_type
    }

    fn take(&self, correlation_id: &CorrelationId) -> Option<PendingCall<R>> {
        let (_, call) = self.pending.remove(correlation_id)?;
        metrics::PENDING_CALLS
            .with_label_values(&[self.call_type])
            .dec();
        Some(call)
    }

    fn fulfill(&self, correlation_id: &CorrelationId, call: PendingCall<R>, resolution: Resolution<R>) {
        if call.resolver.send(resolution).is_err() {
            // Receiver was dropped (caller gave up)
            self.stats.abandoned.fetch_add(1, Ordering::Relaxed);
            debug!(
                correlation_id = %correlation_id,
                call_type = self.call_type,
                "Pending call receiver dropped"
            );
        }
    }
}
