//! Error types for rl-accounts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::IdError;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while building or validating domain values.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// A required field was empty or malformed.
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// The offending field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Business failures surfaced to callers when a subscription change is refused.
///
/// These values are stable: they never depend on the wording or codes of the
/// billing provider, and they serialize to the exact strings clients match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InternalErrorKind {
    /// The provider declined the charge or otherwise refused the change.
    PaymentFailed,
    /// The customer has no usable payment method on file.
    NoPaymentMethod,
}

impl InternalErrorKind {
    /// The wire representation of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PaymentFailed => "PAYMENT_FAILED",
            Self::NoPaymentMethod => "NO_PAYMENT_METHOD",
        }
    }
}

impl fmt::Display for InternalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
