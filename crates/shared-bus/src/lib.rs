//! # Shared Bus - Publish/Subscribe Transport
//!
//! The transport port the request/reply bridge is built on, plus an
//! in-memory implementation.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Requester   │                    │  Responder   │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │     Bus      │          │
//!                  │  (channels)  │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Messages are opaque bytes; envelope encoding belongs to the caller.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod publisher;
pub mod subscriber;
pub mod transport;

// Re-export main types
pub use publisher::InMemoryBus;
pub use subscriber::Subscription;
pub use transport::{validate_channel, Transport, TransportError};

/// Maximum messages to buffer per channel before slow subscribers lag.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
