//! # Error Types
//!
//! Errors raised while encoding or decoding envelopes.

use thiserror::Error;

/// Errors from the envelope wire codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The envelope could not be serialized.
    #[error("Encode failed: {0}")]
    Encode(String),

    /// The bytes are not a valid envelope for the expected payload type.
    #[error("Malformed message: {0}")]
    Decode(String),

    /// A request envelope named no reply channel.
    #[error("Malformed message: request has an empty reply channel")]
    MissingReplyChannel,
}
