//! Handle a caller awaits for one in-flight call.

use crate::domain::registry::CorrelationRegistry;
use crate::domain::resolution::Resolution;
use shared_types::CorrelationId;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::debug;

/// Future resolving to the outcome of one call.
///
/// Completes with `Resolution::Reply` when a matching reply arrives, or with
/// `Resolution::Fallback` once the deadline passes. Dropping it before it
/// completes removes the call from the registry and cancels its timeout
/// guard, so abandoned calls do not linger until their deadline.
#[must_use = "a pending reply does nothing unless awaited"]
pub struct PendingReply<R> {
    correlation_id: CorrelationId,
    deadline: Instant,
    receiver: oneshot::Receiver<Resolution<R>>,
    registry: Arc<CorrelationRegistry<R>>,
    guard: Option<AbortHandle>,
    fallback: R,
    finished: bool,
}

impl<R> PendingReply<R> {
    pub(crate) fn new(
        correlation_id: CorrelationId,
        deadline: Instant,
        receiver: oneshot::Receiver<Resolution<R>>,
        registry: Arc<CorrelationRegistry<R>>,
        fallback: R,
    ) -> Self {
        Self {
            correlation_id,
            deadline,
            receiver,
            registry,
            guard: None,
            fallback,
            finished: false,
        }
    }

    /// Attach the timeout guard scheduled for this call.
    pub(crate) fn arm(&mut self, guard: AbortHandle) {
        self.guard = Some(guard);
    }

    /// Correlation ID the request was published with.
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// Instant at which the fallback applies.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    fn finish(&mut self) {
        self.finished = true;
        if let Some(guard) = self.guard.take() {
            guard.abort();
        }
    }
}

// No field is structurally pinned.
impl<R> Unpin for PendingReply<R> {}

impl<R: Clone> Future for PendingReply<R> {
    type Output = Resolution<R>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let resolution = match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Ok(resolution)) => resolution,
            // Entry discarded without a value
            Poll::Ready(Err(_)) => Resolution::Fallback(this.fallback.clone()),
        };
        this.finish();
        Poll::Ready(resolution)
    }
}

impl<R> Drop for PendingReply<R> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(guard) = self.guard.take() {
            guard.abort();
        }
        if self.registry.discard(&self.correlation_id) {
            debug!(
                correlation_id = %self.correlation_id,
                call_type = self.registry.call_type(),
                "Caller stopped waiting, pending call discarded"
            );
        }
    }
}

impl<R> std::fmt::Debug for PendingReply<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingReply")
            .field("correlation_id", &self.correlation_id)
            .field("deadline", &self.deadline)
            .field("finished", &self.finished)
            .finish()
    }
}
