//! # Integration Tests
//!
//! Requesters and responders talking over a real `InMemoryBus`, across
//! crate boundaries.

pub mod concurrency;
pub mod scenarios;
pub mod wire;
