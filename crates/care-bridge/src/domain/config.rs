//! Bridge configuration with validation.
//!
//! One `CallConfig` per call type. Defaults match the channels the
//! marketplace services already publish on.

use crate::calls::{AnnouncementOwner, ApplicationVerification, CallType, UserExists};
use crate::domain::error::{BridgeError, ConfigError};
use crate::domain::policy::FallbackPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Longest timeout a call may be configured with.
pub const MAX_CALL_TIMEOUT: Duration = Duration::from_secs(3600);

/// Channels, timeout and fallback for one call type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallConfig {
    /// Channel requests are published on
    pub request_channel: String,
    /// Channel responders publish replies on
    pub reply_channel: String,
    /// Time to wait for a reply before applying the fallback
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Value to resolve with on timeout
    pub fallback: FallbackPolicy,
}

impl CallConfig {
    pub fn new(
        request_channel: impl Into<String>,
        reply_channel: impl Into<String>,
        timeout: Duration,
        fallback: FallbackPolicy,
    ) -> Self {
        Self {
            request_channel: request_channel.into(),
            reply_channel: reply_channel.into(),
            timeout,
            fallback,
        }
    }

    /// Same config with a different timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Same config with a different fallback policy.
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.request_channel.trim().is_empty() {
            return Err(BridgeError::InvalidChannel {
                field: "request",
                value: self.request_channel.clone(),
            });
        }
        if self.reply_channel.trim().is_empty() {
            return Err(BridgeError::InvalidChannel {
                field: "reply",
                value: self.reply_channel.clone(),
            });
        }
        if self.timeout.is_zero() || self.timeout > MAX_CALL_TIMEOUT {
            return Err(BridgeError::InvalidTimeout);
        }
        Ok(())
    }

    /// Apply `<prefix>_TIMEOUT_MS` and `<prefix>_FALLBACK` overrides.
    ///
    /// Invalid values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, prefix: &str, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_var = format!("{prefix}_TIMEOUT_MS");
        if let Some(value) = lookup(&timeout_var) {
            match parse_timeout_ms(&timeout_var, &value) {
                Ok(timeout) => self.timeout = timeout,
                Err(e) => warn!(error = %e, "Ignoring timeout override"),
            }
        }

        let fallback_var = format!("{prefix}_FALLBACK");
        if let Some(value) = lookup(&fallback_var) {
            match value.parse::<FallbackPolicy>() {
                Ok(policy) => self.fallback = policy,
                Err(e) => warn!(var = %fallback_var, error = %e, "Ignoring fallback override"),
            }
        }
    }
}

fn parse_timeout_ms(var: &str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidTimeout {
            var: var.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Configuration for all three call types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Chat service asking whether a recipient exists
    pub user_exists: CallConfig,
    /// Looking up the user who owns an announcement
    pub announcement_owner: CallConfig,
    /// Checking a user has an accepted application for an announcement
    pub application_verification: CallConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            user_exists: UserExists::default_config(),
            announcement_owner: AnnouncementOwner::default_config(),
            application_verification: ApplicationVerification::default_config(),
        }
    }
}

impl BridgeConfig {
    /// Defaults with overrides from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CARE_USER_EXISTS_TIMEOUT_MS`, `CARE_USER_EXISTS_FALLBACK`
    /// - `CARE_ANNOUNCEMENT_OWNER_TIMEOUT_MS`, `CARE_ANNOUNCEMENT_OWNER_FALLBACK`
    /// - `CARE_APPLICATION_VERIFICATION_TIMEOUT_MS`, `CARE_APPLICATION_VERIFICATION_FALLBACK`
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults with overrides from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config
            .user_exists
            .apply_overrides("CARE_USER_EXISTS", &lookup);
        config
            .announcement_owner
            .apply_overrides("CARE_ANNOUNCEMENT_OWNER", &lookup);
        config
            .application_verification
            .apply_overrides("CARE_APPLICATION_VERIFICATION", &lookup);
        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), BridgeError> {
        self.user_exists.validate()?;
        self.announcement_owner.validate()?;
        self.application_verification.validate()
    }
}

/// Humantime serde module for Duration serialization
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" before "s", or "200ms" would parse as "200m" seconds
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .ok()
                .and_then(|m| m.checked_mul(60))
                .map(Duration::from_secs)
                .ok_or("invalid minutes")
        } else {
            // Try parsing as plain seconds
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
