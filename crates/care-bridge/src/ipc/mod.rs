//! Bus-facing side of the bridge.
//!
//! The requester publishes requests and owns a reply listener; responders
//! answer requests; timeout guards apply fallbacks at deadlines.

pub mod listener;
pub mod pending;
pub mod requester;
pub mod responder;
pub(crate) mod timeout;

pub use listener::ReplyListener;
pub use pending::PendingReply;
pub use requester::Requester;
pub use responder::{handler_fn, FnHandler, RequestHandler, Responder};
