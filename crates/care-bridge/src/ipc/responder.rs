//! # Responder
//!
//! Answers requests of one call type arriving on a request channel.
//!
//! ```text
//! request channel ──► Responder::run ──spawn──► handler.handle(payload)
//!                                                     │
//!          envelope.reply_channel ◄── ReplyEnvelope ◄─┘
//! ```
//!
//! Each request is handled in its own task, so a slow lookup does not hold
//! up the requests behind it. A handler that errors or panics produces no
//! reply; the requester resolves that call through its fallback.

use crate::calls::CallType;
use crate::domain::error::{BridgeError, HandlerError};
use async_trait::async_trait;
use bytes::Bytes;
use care_telemetry::metrics::{self, ROLE_RESPONDER};
use futures::FutureExt;
use shared_bus::{validate_channel, Subscription, Transport};
use shared_types::{ReplyEnvelope, RequestEnvelope};
use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Business logic behind a responder.
#[async_trait]
pub trait RequestHandler<C: CallType>: Send + Sync + 'static {
    /// Compute the reply for one request.
    async fn handle(&self, request: C::Request) -> Result<C::Reply, HandlerError>;
}

/// Adapter turning an async closure into a [`RequestHandler`].
pub struct FnHandler<C, F> {
    f: F,
    _call: PhantomData<fn() -> C>,
}

/// Wrap an async closure as a handler.
///
/// ```rust,ignore
/// let handler = handler_fn::<UserExists, _, _>(|username: String| async move {
///     Ok::<_, HandlerError>(users.contains(&username))
/// });
/// ```
pub fn handler_fn<C, F, Fut>(f: F) -> FnHandler<C, F>
where
    C: CallType,
    F: Fn(C::Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<C::Reply, HandlerError>> + Send + 'static,
{
    FnHandler {
        f,
        _call: PhantomData,
    }
}

#[async_trait]
impl<C, F, Fut> RequestHandler<C> for FnHandler<C, F>
where
    C: CallType,
    F: Fn(C::Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<C::Reply, HandlerError>> + Send + 'static,
{
    async fn handle(&self, request: C::Request) -> Result<C::Reply, HandlerError> {
        (self.f)(request).await
    }
}

/// Subscribes to a request channel and answers each request.
pub struct Responder<C: CallType> {
    transport: Arc<dyn Transport>,
    request_channel: String,
    handler: Arc<dyn RequestHandler<C>>,
}

impl<C: CallType> Responder<C> {
    pub fn new<H>(
        transport: Arc<dyn Transport>,
        request_channel: impl Into<String>,
        handler: H,
    ) -> Result<Self, BridgeError>
    where
        H: RequestHandler<C>,
    {
        let request_channel = request_channel.into();
        validate_channel(&request_channel).map_err(|_| BridgeError::InvalidChannel {
            field: "request",
            value: request_channel.clone(),
        })?;

        Ok(Self {
            transport,
            request_channel,
            handler: Arc::new(handler),
        })
    }

    /// Responder on the call type's default request channel.
    pub fn with_defaults<H>(transport: Arc<dyn Transport>, handler: H) -> Result<Self, BridgeError>
    where
        H: RequestHandler<C>,
    {
        Self::new(transport, C::default_config().request_channel, handler)
    }

    /// Subscribe and start answering requests in a background task.
    ///
    /// The subscription is in place when this returns. The task ends when
    /// the transport closes the channel, or when the handle is aborted.
    pub fn spawn(self) -> Result<JoinHandle<()>, BridgeError> {
        let subscription = self.transport.subscribe(&self.request_channel).map_err(|source| {
            BridgeError::SubscribeFailed {
                channel: self.request_channel.clone(),
                source,
            }
        })?;
        Ok(tokio::spawn(self.run(subscription)))
    }

    #[instrument(skip_all, name = "responder", fields(call_type = C::NAME))]
    async fn run(self, mut subscription: Subscription) {
        info!(channel = %self.request_channel, "Responder started");

        while let Some(message) = subscription.recv().await {
            self.dispatch(message);
        }

        info!(channel = %self.request_channel, "Responder stopped");
    }

    fn dispatch(&self, message: Bytes) {
        let envelope = match RequestEnvelope::<C::Request>::decode(&message) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(
                    channel = %self.request_channel,
                    call_type = C::NAME,
                    error = %e,
                    "Dropping malformed request"
                );
                metrics::MALFORMED_MESSAGES_TOTAL
                    .with_label_values(&[C::NAME, ROLE_RESPONDER])
                    .inc();
                return;
            }
        };

        debug!(
            correlation_id = %envelope.correlation_id,
            call_type = C::NAME,
            "Received request"
        );

        tokio::spawn(answer(
            self.transport.clone(),
            self.handler.clone(),
            envelope,
        ));
    }
}

/// Run the handler for one request and publish its reply.
async fn answer<C: CallType>(
    transport: Arc<dyn Transport>,
    handler: Arc<dyn RequestHandler<C>>,
    envelope: RequestEnvelope<C::Request>,
) {
    let RequestEnvelope {
        correlation_id,
        reply_channel,
        payload,
    } = envelope;

    let reply = match AssertUnwindSafe(handler.handle(payload))
        .catch_unwind()
        .await
    {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => {
            error!(
                correlation_id = %correlation_id,
                call_type = C::NAME,
                error = %e,
                "Handler failed, no reply sent"
            );
            metrics::HANDLER_FAILURES_TOTAL
                .with_label_values(&[C::NAME])
                .inc();
            return;
        }
        Err(panic) => {
            error!(
                correlation_id = %correlation_id,
                call_type = C::NAME,
                panic = panic_message(panic.as_ref()),
                "Handler panicked, no reply sent"
            );
            metrics::HANDLER_FAILURES_TOTAL
                .with_label_values(&[C::NAME])
                .inc();
            return;
        }
    };

    let message = match ReplyEnvelope::new(correlation_id, reply).encode() {
        Ok(message) => message,
        Err(e) => {
            error!(
                correlation_id = %correlation_id,
                call_type = C::NAME,
                error = %e,
                "Failed to encode reply"
            );
            return;
        }
    };

    match transport.publish(&reply_channel, message).await {
        Ok(()) => {
            metrics::REQUESTS_HANDLED_TOTAL
                .with_label_values(&[C::NAME])
                .inc();
            debug!(
                correlation_id = %correlation_id,
                call_type = C::NAME,
                channel = %reply_channel,
                "Published reply"
            );
        }
        Err(e) => {
            error!(
                correlation_id = %correlation_id,
                call_type = C::NAME,
                channel = %reply_channel,
                error = %e,
                "Failed to publish reply"
            );
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
