//! How a call ended.

/// Final value of a call, tagged with where it came from.
///
/// A `Fallback(false)` and a `Reply(false)` carry the same value but mean
/// different things: the first is "nobody answered in time".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<R> {
    /// A responder answered before the deadline.
    Reply(R),
    /// The deadline passed and the fallback policy supplied the value.
    Fallback(R),
}

impl<R> Resolution<R> {
    /// Whether the value came from the fallback policy.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    /// Borrow the value.
    pub fn value(&self) -> &R {
        match self {
            Self::Reply(value) | Self::Fallback(value) => value,
        }
    }

    /// Take the value, discarding its origin.
    pub fn into_value(self) -> R {
        match self {
            Self::Reply(value) | Self::Fallback(value) => value,
        }
    }
}
