//! Bridge error types.

use crate::domain::policy::FallbackPolicy;
use shared_bus::TransportError;
use shared_types::{CodecError, CorrelationId};
use thiserror::Error;

/// Errors surfaced synchronously by the bridge.
///
/// A timeout is not an error: it resolves the call through its fallback
/// policy. Only precondition, configuration and publish failures end up here.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Invalid {field} channel: '{value}'")]
    InvalidChannel { field: &'static str, value: String },

    #[error("Call timeout must be greater than zero and at most one hour")]
    InvalidTimeout,

    #[error("Fallback policy {policy} is not supported by call type {call_type}")]
    UnsupportedPolicy {
        call_type: &'static str,
        policy: FallbackPolicy,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Failed to publish request on '{channel}': {source}")]
    PublishFailed {
        channel: String,
        #[source]
        source: TransportError,
    },

    #[error("Failed to subscribe to '{channel}': {source}")]
    SubscribeFailed {
        channel: String,
        #[source]
        source: TransportError,
    },
}

impl BridgeError {
    /// Whether the transport refused the request.
    pub fn is_publish_failure(&self) -> bool {
        matches!(self, Self::PublishFailed { .. })
    }
}

/// Correlation registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An id was registered twice. Ids are generated fresh per call, so this
    /// is a programming error.
    #[error("Correlation ID already pending: {0}")]
    DuplicateCorrelationId(CorrelationId),
}

/// Failure reported by a responder's business handler.
///
/// The responder logs it and sends no reply; the requester sees a timeout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("Handler failed: {0}")]
    Failed(String),

    #[error("Lookup backend unavailable: {0}")]
    Unavailable(String),
}

/// Configuration parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Unknown fallback policy '{0}' (expected reject, accept or null)")]
    InvalidFallback(String),

    #[error("Invalid timeout in {var}: '{value}'")]
    InvalidTimeout { var: String, value: String },
}
