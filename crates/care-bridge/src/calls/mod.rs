//! Call types carried over the bridge.
//!
//! | Call type | Request | Reply | Default fallback |
//! |-----------|---------|-------|------------------|
//! | `UserExists` | username | `bool` | accept |
//! | `AnnouncementOwner` | announcement id | owner username, if any | null |
//! | `ApplicationVerification` | username + announcement id | `bool` | reject |

use crate::domain::config::CallConfig;
use crate::domain::policy::{FallbackPolicy, FallbackValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout the marketplace services use for every bridged lookup.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// A request/reply pair carried over the bridge.
///
/// Each call type fixes its payload types and its default channels, timeout
/// and fallback policy.
pub trait CallType: Send + Sync + 'static {
    /// Label used in logs and metrics.
    const NAME: &'static str;

    /// Request payload.
    type Request: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Reply payload.
    type Reply: Serialize + DeserializeOwned + FallbackValue + Clone + Send + Sync + 'static;

    /// Channels, timeout and fallback used unless configured otherwise.
    fn default_config() -> CallConfig;
}

/// Does a user with this username exist?
///
/// Asked by the chat service before opening a conversation. Fails open: when
/// the user service is unavailable, the conversation is allowed.
#[derive(Debug, Clone, Copy)]
pub struct UserExists;

impl CallType for UserExists {
    const NAME: &'static str = "user_exists";
    type Request = String;
    type Reply = bool;

    fn default_config() -> CallConfig {
        CallConfig::new(
            "user-exists-topic",
            "chat-user-exists-reply",
            DEFAULT_CALL_TIMEOUT,
            FallbackPolicy::Accept,
        )
    }
}

/// Who owns this announcement?
///
/// `None` both when the announcement does not exist and when the
/// announcement service did not answer.
#[derive(Debug, Clone, Copy)]
pub struct AnnouncementOwner;

impl CallType for AnnouncementOwner {
    const NAME: &'static str = "announcement_owner";
    type Request = i64;
    type Reply = Option<String>;

    fn default_config() -> CallConfig {
        CallConfig::new(
            "announcement.owner.request",
            "announcement.owner.response",
            DEFAULT_CALL_TIMEOUT,
            FallbackPolicy::Null,
        )
    }
}

/// Request body for `ApplicationVerification`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceQuery {
    pub username: String,
    pub announcement_id: i64,
}

impl AcceptanceQuery {
    pub fn new(username: impl Into<String>, announcement_id: i64) -> Self {
        Self {
            username: username.into(),
            announcement_id,
        }
    }
}

/// Has this user an accepted application for this announcement?
///
/// Gates ratings and reviews, so it fails closed.
#[derive(Debug, Clone, Copy)]
pub struct ApplicationVerification;

impl CallType for ApplicationVerification {
    const NAME: &'static str = "application_verification";
    type Request = AcceptanceQuery;
    type Reply = bool;

    fn default_config() -> CallConfig {
        CallConfig::new(
            "application.verify.request",
            "application.verify.response",
            DEFAULT_CALL_TIMEOUT,
            FallbackPolicy::Reject,
        )
    }
}
