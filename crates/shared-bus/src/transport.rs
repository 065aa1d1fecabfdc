//! # Transport Port
//!
//! The only interface the bridge needs from a message bus: publish raw bytes
//! to a named channel, and subscribe to a named channel.

use crate::subscriber::Subscription;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors from transport operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport rejected the operation (broker down, bus closed).
    #[error("Transport unavailable for channel '{channel}': {reason}")]
    Unavailable { channel: String, reason: String },

    /// Channel names must be non-empty.
    #[error("Invalid channel name: '{0}'")]
    InvalidChannel(String),
}

/// Publish/subscribe port over a topic-based bus.
///
/// Delivery guarantees (at-most-once, at-least-once, ordering) belong to the
/// implementation. Publishing to a channel nobody listens on is not an error.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish a message on a channel.
    async fn publish(&self, channel: &str, message: Bytes) -> Result<(), TransportError>;

    /// Subscribe to all messages published on a channel from now on.
    fn subscribe(&self, channel: &str) -> Result<Subscription, TransportError>;
}

/// Reject empty channel names.
pub fn validate_channel(channel: &str) -> Result<(), TransportError> {
    if channel.trim().is_empty() {
        return Err(TransportError::InvalidChannel(channel.to_string()));
    }
    Ok(())
}
