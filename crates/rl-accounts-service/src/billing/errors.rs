//! Provider error code table.
//!
//! Subscription changes that the provider refuses with a code are business
//! failures the caller can act on. Anything the provider did not code is an
//! infrastructure fault and is passed through untouched.

use rl_accounts_core::InternalErrorKind;

use super::provider::ProviderError;

/// Provider code for a missing customer, source or plan.
pub const RESOURCE_MISSING: &str = "resource_missing";

/// Decline codes known to mean the charge itself failed.
const DECLINE_CODES: &[&str] = &[
    "card_declined",
    "expired_card",
    "incorrect_cvc",
    "incorrect_number",
    "invalid_cvc",
    "invalid_expiry_month",
    "invalid_expiry_year",
    "processing_error",
    "insufficient_funds",
];

/// Translate a provider failure raised by a subscription change.
///
/// Returns `None` when the failure carries no code.
#[must_use]
pub fn classify(err: &ProviderError) -> Option<InternalErrorKind> {
    let code = err.code()?;

    if code == RESOURCE_MISSING {
        return Some(InternalErrorKind::NoPaymentMethod);
    }

    if !DECLINE_CODES.contains(&code) {
        tracing::debug!(code, "Unrecognized provider code treated as payment failure");
    }
    Some(InternalErrorKind::PaymentFailed)
}
