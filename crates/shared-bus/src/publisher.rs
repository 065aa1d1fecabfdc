//! # In-Memory Bus
//!
//! Channel-keyed publish/subscribe bus for single-process deployments and tests.

use crate::subscriber::Subscription;
use crate::transport::{validate_channel, Transport, TransportError};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

/// In-memory implementation of the transport port.
///
/// Each channel is a `tokio::sync::broadcast` channel, created lazily on first
/// publish or subscribe. Every subscriber of a channel sees every message
/// published after it subscribed. Distributed deployments would use a
/// different implementation (e.g., Kafka).
pub struct InMemoryBus {
    /// Broadcast sender per channel name.
    channels: RwLock<HashMap<String, broadcast::Sender<Bytes>>>,

    /// Set once `close()` is called; all further operations fail.
    closed: AtomicBool,

    /// Total messages published.
    messages_published: AtomicU64,

    /// Per-channel buffer capacity.
    capacity: usize,
}

impl InMemoryBus {
    /// Create a new in-memory bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory bus with specified per-channel capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
            messages_published: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Close the bus.
    ///
    /// Existing subscriptions end after draining buffered messages, and every
    /// subsequent publish or subscribe fails with `TransportError::Unavailable`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.channels.write().clear();
        info!("In-memory bus closed");
    }

    /// Whether `close()` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of live subscribers on a channel.
    #[must_use]
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .read()
            .get(channel)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Total messages published (including those nobody received).
    #[must_use]
    pub fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }

    /// Get the per-channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn ensure_open(&self, channel: &str) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Unavailable {
                channel: channel.to_string(),
                reason: "bus closed".into(),
            });
        }
        Ok(())
    }

    fn sender_for(&self, channel: &str) -> broadcast::Sender<Bytes> {
        if let Some(sender) = self.channels.read().get(channel) {
            return sender.clone();
        }
        self.channels
            .write()
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for InMemoryBus {
    async fn publish(&self, channel: &str, message: Bytes) -> Result<(), TransportError> {
        validate_channel(channel)?;
        self.ensure_open(channel)?;

        self.messages_published.fetch_add(1, Ordering::Relaxed);

        let sender = self.channels.read().get(channel).cloned();
        match sender.map(|s| s.send(message)) {
            Some(Ok(receivers)) => {
                debug!(channel = channel, receivers = receivers, "Message published");
            }
            Some(Err(_)) | None => {
                // No receivers - message is dropped, as on a real bus
                debug!(channel = channel, "Message dropped (no subscribers)");
            }
        }
        Ok(())
    }

    fn subscribe(&self, channel: &str) -> Result<Subscription, TransportError> {
        validate_channel(channel)?;
        self.ensure_open(channel)?;

        let receiver = self.sender_for(channel).subscribe();
        let name = channel.to_string();
        let stream = BroadcastStream::new(receiver).filter_map(move |item| match item {
            Ok(message) => Some(message),
            Err(lagged) => {
                warn!(channel = %name, error = %lagged, "Subscriber lagged, messages dropped");
                None
            }
        });

        debug!(channel = channel, "New subscription created");
        Ok(Subscription::from_stream(channel, stream))
    }
}
