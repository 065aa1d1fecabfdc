//! Timeout Guard - per-call deadline that applies the fallback.

use crate::domain::registry::CorrelationRegistry;
use shared_types::CorrelationId;
use std::sync::Arc;
use tokio::task::AbortHandle;
use tokio::time::{sleep_until, Instant};
use tracing::warn;

/// Spawn the guard for one pending call.
///
/// Sleeps on the tokio timer until `deadline`, then evicts the call with
/// `fallback` if it is still pending. Aborting the returned handle cancels
/// the guard; a guard that fires after a reply is a no-op.
pub(crate) fn spawn_timeout_guard<R>(
    registry: Arc<CorrelationRegistry<R>>,
    correlation_id: CorrelationId,
    deadline: Instant,
    fallback: R,
) -> AbortHandle
where
    R: Send + Sync + 'static,
{
    tokio::spawn(async move {
        sleep_until(deadline).await;
        if registry.evict_if_pending(&correlation_id, fallback) {
            warn!(
                correlation_id = %correlation_id,
                call_type = registry.call_type(),
                "call timed out, applying fallback"
            );
        }
    })
    .abort_handle()
}
