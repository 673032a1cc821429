//! Rule outcomes
//!
//! Provides [`Outcome`], the result of evaluating a rule, and [`IntoOutcome`]
//! for check functions that only report failures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of evaluating a single rule or a whole validation pass
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Rule passed
    #[default]
    Valid,

    /// Rule failed; the message is shown to the operator verbatim
    Invalid {
        /// Human-readable reason
        message: String,
    },
}

impl Outcome {
    /// Create failing outcome
    #[inline]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Outcome from a condition, failing with `message` when it does not hold
    #[inline]
    pub fn check(condition: bool, message: impl FnOnce() -> String) -> Self {
        if condition {
            Self::Valid
        } else {
            Self::invalid(message())
        }
    }

    /// Check if outcome is valid
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Failure message, if any
    #[inline]
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid { message } => Some(message),
        }
    }

    /// Evaluate `next` only if this outcome is valid
    #[inline]
    pub fn and_then<F>(self, next: F) -> Self
    where
        F: FnOnce() -> Self,
    {
        match self {
            Self::Valid => next(),
            invalid => invalid,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Invalid { message } => write!(f, "invalid: {message}"),
        }
    }
}

/// Conversion for check-function return values
///
/// Legacy checks may return nothing (`()`) or `None` to mean success; the
/// adapter turns every such value into an explicit [`Outcome`].
pub trait IntoOutcome {
    /// Convert into an explicit outcome
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Outcome {
    #[inline]
    fn into_outcome(self) -> Outcome {
        self
    }
}

impl IntoOutcome for Option<Outcome> {
    #[inline]
    fn into_outcome(self) -> Outcome {
        self.unwrap_or_default()
    }
}

impl IntoOutcome for () {
    #[inline]
    fn into_outcome(self) -> Outcome {
        Outcome::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_carries_message() {
        let outcome = Outcome::invalid("flavor not found");
        assert!(!outcome.is_valid());
        assert_eq!(outcome.message(), Some("flavor not found"));
        assert_eq!(outcome.to_string(), "invalid: flavor not found");
    }

    #[test]
    fn check_builds_message_lazily() {
        assert_eq!(Outcome::check(true, || unreachable!()), Outcome::Valid);
        assert_eq!(
            Outcome::check(false, || "nope".to_string()),
            Outcome::invalid("nope")
        );
    }

    #[test]
    fn and_then_short_circuits() {
        let first = Outcome::invalid("first");
        assert_eq!(first.and_then(|| Outcome::invalid("second")).message(), Some("first"));
        assert_eq!(
            Outcome::Valid.and_then(|| Outcome::invalid("second")).message(),
            Some("second")
        );
    }

    #[test]
    fn implicit_success_conversions() {
        assert_eq!(().into_outcome(), Outcome::Valid);
        assert_eq!(None::<Outcome>.into_outcome(), Outcome::Valid);
        assert_eq!(
            Some(Outcome::invalid("x")).into_outcome(),
            Outcome::invalid("x")
        );
    }

    #[test]
    fn serializes_with_status_tag() {
        let json = serde_json::to_value(Outcome::invalid("bad")).unwrap();
        assert_eq!(json, serde_json::json!({"status": "invalid", "message": "bad"}));
    }
}
