//! Domain types for the bridge.
//!
//! The correlation registry, fallback policies, configuration and errors.
//! Tokio tasks (listener, guard, responder loop) live in `crate::ipc`.

pub mod config;
pub mod error;
pub mod policy;
pub mod registry;
pub mod resolution;

// Re-exports for convenience
pub use config::{BridgeConfig, CallConfig, MAX_CALL_TIMEOUT};
pub use error::{BridgeError, ConfigError, HandlerError, RegistryError};
pub use policy::{FallbackPolicy, FallbackValue};
pub use registry::{CorrelationRegistry, RegistryStats};
pub use resolution::Resolution;
