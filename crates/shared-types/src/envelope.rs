//! # Request/Reply Envelopes
//!
//! The two messages exchanged by the bridge.
//!
//! ## Wire Format
//!
//! Envelopes are encoded as compact JSON objects with camelCase keys:
//!
//! ```text
//! request: {"correlationId":"<uuid>","replyChannel":"<channel>","payload":<P>}
//! reply:   {"correlationId":"<uuid>","payload":<R>}
//! ```
//!
//! Encoding is deterministic for a given payload (struct fields serialize in
//! declaration order), and `decode(encode(e)) == e` for every envelope.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::correlation::CorrelationId;
use crate::errors::CodecError;

/// A request published by a requester on a request channel.
///
/// The `reply_channel` tells the responder where to publish the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope<P> {
    /// Fresh id generated by the requester for this call.
    pub correlation_id: CorrelationId,
    /// Channel the reply must be published to.
    pub reply_channel: String,
    /// Call-type specific request body.
    pub payload: P,
}

impl<P> RequestEnvelope<P> {
    /// Create a new request envelope.
    pub fn new(correlation_id: CorrelationId, reply_channel: impl Into<String>, payload: P) -> Self {
        Self {
            correlation_id,
            reply_channel: reply_channel.into(),
            payload,
        }
    }

    /// Build the reply for this request, carrying back the same correlation id.
    pub fn reply<R>(&self, payload: R) -> ReplyEnvelope<R> {
        ReplyEnvelope::new(self.correlation_id, payload)
    }
}

impl<P: Serialize> RequestEnvelope<P> {
    /// Encode to wire bytes.
    pub fn encode(&self) -> Result<Bytes, CodecError> {
        encode(self)
    }
}

impl<P: DeserializeOwned> RequestEnvelope<P> {
    /// Decode from wire bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let envelope: Self = decode(bytes)?;
        if envelope.reply_channel.is_empty() {
            return Err(CodecError::MissingReplyChannel);
        }
        Ok(envelope)
    }
}

/// A reply published by a responder on the reply channel named in the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyEnvelope<R> {
    /// Correlation id copied from the request.
    pub correlation_id: CorrelationId,
    /// Call-type specific reply body.
    pub payload: R,
}

impl<R> ReplyEnvelope<R> {
    /// Create a new reply envelope.
    pub fn new(correlation_id: CorrelationId, payload: R) -> Self {
        Self {
            correlation_id,
            payload,
        }
    }
}

impl<R: Serialize> ReplyEnvelope<R> {
    /// Encode to wire bytes.
    pub fn encode(&self) -> Result<Bytes, CodecError> {
        encode(self)
    }
}

impl<R: DeserializeOwned> ReplyEnvelope<R> {
    /// Decode from wire bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        decode(bytes)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Bytes, CodecError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| CodecError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}
