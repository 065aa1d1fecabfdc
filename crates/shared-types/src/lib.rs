//! # Shared Types Crate
//!
//! Correlation identifiers and the request/reply envelopes that flow over the
//! bus between requesters and responders.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the wire format is defined here and nowhere else.
//! - **Correlation by id only**: a reply is matched to its request solely by
//!   the `correlation_id` it carries back.

pub mod correlation;
pub mod envelope;
pub mod errors;

pub use correlation::CorrelationId;
pub use envelope::{ReplyEnvelope, RequestEnvelope};
pub use errors::CodecError;
