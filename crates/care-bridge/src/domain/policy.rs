//! Fallback policies applied when no reply arrives before the deadline.

use crate::domain::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a call resolves to when it times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Negative answer: `false`, empty.
    Reject,
    /// Permissive answer (fail open): `true`.
    Accept,
    /// Absent value.
    Null,
}

impl FallbackPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Accept => "accept",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FallbackPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "accept" => Ok(Self::Accept),
            "null" => Ok(Self::Null),
            _ => Err(ConfigError::InvalidFallback(s.to_string())),
        }
    }
}

/// Reply payloads that can be synthesized by a fallback policy.
///
/// Returns `None` when the payload type has no sensible value for the
/// policy; requesters refuse such configurations at construction.
pub trait FallbackValue: Sized {
    fn fallback_for(policy: FallbackPolicy) -> Option<Self>;
}

impl FallbackValue for bool {
    fn fallback_for(policy: FallbackPolicy) -> Option<Self> {
        match policy {
            FallbackPolicy::Reject => Some(false),
            FallbackPolicy::Accept => Some(true),
            // There is no absent boolean.
            FallbackPolicy::Null => None,
        }
    }
}

impl<T> FallbackValue for Option<T> {
    fn fallback_for(policy: FallbackPolicy) -> Option<Self> {
        match policy {
            FallbackPolicy::Reject | FallbackPolicy::Null => Some(None),
            FallbackPolicy::Accept => None,
        }
    }
}
