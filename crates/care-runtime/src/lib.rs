//! # Care Runtime Library
//!
//! Single-process deployment of the request/reply bridge. This library
//! exposes the runtime's modules for testing; the entry point is the
//! `main.rs` binary.

pub mod clients;
pub mod config;
pub mod handlers;
pub mod runtime;
pub mod stores;

pub use clients::BridgeClients;
pub use config::RuntimeConfig;
pub use runtime::{CareRuntime, SelfCheckReport};
pub use stores::Stores;
