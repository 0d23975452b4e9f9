//! Payment method types.
//!
//! A payment method is a provider-held funding source normalized to a stable
//! shape. The provider is the system of record; these values are built on
//! demand and never persisted.

use serde::{Deserialize, Serialize};

/// Card details exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInfo {
    /// Card brand (e.g. "Visa").
    pub brand: String,
    /// Expiry month, 1-12.
    pub exp_month: u32,
    /// Expiry year.
    pub exp_year: u32,
    /// Last four digits.
    pub last4: String,
}

/// A customer's payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    /// Provider source id.
    pub id: String,
    /// Whether this is the customer's default source.
    pub is_default: bool,
    /// Card details.
    pub card_info: CardInfo,
}
