//! # Care Bridge
//!
//! Turns a one-way publish/subscribe bus into calls that look synchronous to
//! their callers: correlation-based request/reply.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  Requester<C>                                                      │
//! │    call(payload) ──► CorrelationRegistry::register                 │
//! │                  ──► Transport::publish(request_channel)           │
//! │                  ──► timeout guard (sleep_until deadline)          │
//! │                  ◄── PendingReply<C::Reply>                        │
//! │                                                                    │
//! │  ReplyListener ──► CorrelationRegistry::resolve                    │
//! └──────────────┬───────────────────────────────────▲─────────────────┘
//!                │ request channel                   │ reply channel
//!                ▼                                   │
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  Responder<C>  ──► RequestHandler<C>::handle ──► ReplyEnvelope     │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every call ends in exactly one of: a matched reply, the fallback at its
//! deadline, or a publish error returned to the caller.
//!
//! # Usage
//!
//! ```ignore
//! use care_bridge::{Requester, UserExists};
//!
//! let requester = Requester::<UserExists>::with_defaults(bus.clone())?;
//! let exists = requester.request("alice".to_string()).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod calls;
pub mod domain;
pub mod ipc;

pub use calls::{
    AcceptanceQuery, AnnouncementOwner, ApplicationVerification, CallType, UserExists,
    DEFAULT_CALL_TIMEOUT,
};
pub use domain::{
    BridgeConfig, BridgeError, CallConfig, ConfigError, CorrelationRegistry, FallbackPolicy,
    FallbackValue, HandlerError, RegistryError, RegistryStats, Resolution, MAX_CALL_TIMEOUT,
};
pub use ipc::{handler_fn, FnHandler, PendingReply, ReplyListener, RequestHandler, Requester, Responder};
