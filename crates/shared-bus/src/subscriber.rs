//! # Subscriber
//!
//! Defines the subscription side of the transport port.

use bytes::Bytes;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

/// A subscription handle delivering raw messages published on one channel.
///
/// When dropped, the subscription stops receiving.
pub struct Subscription {
    /// Channel this subscription listens on.
    channel: String,

    /// Underlying message stream.
    inner: Pin<Box<dyn Stream<Item = Bytes> + Send>>,
}

impl Subscription {
    /// Wrap any message stream as a subscription.
    ///
    /// Transport implementations use this to hand out subscriptions backed by
    /// their own delivery mechanism.
    pub fn from_stream<S>(channel: impl Into<String>, stream: S) -> Self
    where
        S: Stream<Item = Bytes> + Send + 'static,
    {
        Self {
            channel: channel.into(),
            inner: Box::pin(stream),
        }
    }

    /// Receive the next message.
    ///
    /// # Returns
    ///
    /// - `Some(bytes)` - The next message on the channel
    /// - `None` - The transport closed the channel
    pub async fn recv(&mut self) -> Option<Bytes> {
        let message = self.inner.next().await;
        if message.is_none() {
            debug!(channel = %self.channel, "Subscription stream ended");
        }
        message
    }

    /// Get the channel for this subscription.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl Stream for Subscription {
    type Item = Bytes;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}
