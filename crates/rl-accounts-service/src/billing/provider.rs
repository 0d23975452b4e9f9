//! The billing-provider boundary.
//!
//! [`BillingProvider`] is the set of raw provider calls the adapter and the
//! reconciler are built on. Implementations return provider-shaped records and
//! provider failures untouched; no business meaning is attached at this level.

use async_trait::async_trait;

/// A failure reported by, or on the way to, the billing provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered and refused the request.
    #[error("provider rejected request ({}): {message}", code.as_deref().unwrap_or("no code"))]
    Rejected {
        /// Provider error code, e.g. `resource_missing` or `card_declined`.
        code: Option<String>,
        /// Provider error message.
        message: String,
    },

    /// The provider could not be reached or answered with something unreadable.
    #[error("provider transport error: {0}")]
    Transport(String),
}

impl ProviderError {
    /// The provider error code, if the provider supplied one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Rejected { code, .. } => code.as_deref(),
            Self::Transport(_) => None,
        }
    }

    /// Shorthand for a coded rejection.
    #[must_use]
    pub fn coded(code: &str, message: impl Into<String>) -> Self {
        Self::Rejected {
            code: Some(code.to_string()),
            message: message.into(),
        }
    }
}

/// A customer as seen by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCustomer {
    /// Provider customer id.
    pub id: String,
    /// Id of the customer's default payment source.
    pub default_source: Option<String>,
    /// Stored payment sources, in provider order.
    pub sources: Vec<ProviderSource>,
}

/// A stored payment source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSource {
    /// Source id.
    pub id: String,
    /// Source kind, e.g. `"card"`.
    pub kind: String,
    /// Card brand.
    pub brand: String,
    /// Expiry month.
    pub exp_month: u32,
    /// Expiry year.
    pub exp_year: u32,
    /// Last four digits.
    pub last4: String,
}

/// A subscription as seen by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSubscription {
    /// Subscription id.
    pub id: String,
    /// Customer the subscription belongs to.
    pub customer_id: String,
    /// Provider plan id, if the subscription has a plan.
    pub plan_id: Option<String>,
    /// Id of the subscription item carrying the plan.
    pub item_id: Option<String>,
    /// Creation timestamp (Unix seconds).
    pub created: i64,
}

/// Raw billing-provider operations.
///
/// Every call is a request to the provider: nothing is cached and nothing is
/// retried.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Create a customer and return its id.
    async fn create_customer(&self, name: &str, email: &str) -> Result<String, ProviderError>;

    /// Delete a customer.
    async fn delete_customer(&self, customer_id: &str) -> Result<(), ProviderError>;

    /// Fetch a customer together with its stored sources.
    async fn retrieve_customer(&self, customer_id: &str)
        -> Result<ProviderCustomer, ProviderError>;

    /// Make `source_id` the customer's default source.
    async fn set_default_source(
        &self,
        customer_id: &str,
        source_id: &str,
    ) -> Result<(), ProviderError>;

    /// Attach a tokenized source to a customer.
    async fn create_source(
        &self,
        customer_id: &str,
        token: &str,
    ) -> Result<ProviderSource, ProviderError>;

    /// Detach a source from a customer.
    async fn delete_source(&self, customer_id: &str, source_id: &str)
        -> Result<(), ProviderError>;

    /// List a customer's subscriptions in provider order, fetching at most
    /// `max_records`.
    async fn list_subscriptions(
        &self,
        customer_id: &str,
        max_records: usize,
    ) -> Result<Vec<ProviderSubscription>, ProviderError>;

    /// Create a subscription on `plan_id`.
    async fn create_subscription(
        &self,
        customer_id: &str,
        plan_id: &str,
    ) -> Result<ProviderSubscription, ProviderError>;

    /// Move an existing subscription to `plan_id`.
    async fn update_subscription(
        &self,
        subscription: &ProviderSubscription,
        plan_id: &str,
    ) -> Result<ProviderSubscription, ProviderError>;

    /// Delete a subscription immediately.
    async fn delete_subscription(&self, subscription_id: &str) -> Result<(), ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_only_present_on_coded_rejections() {
        assert_eq!(
            ProviderError::coded("resource_missing", "gone").code(),
            Some("resource_missing")
        );
        assert_eq!(
            ProviderError::Rejected {
                code: None,
                message: "boom".into()
            }
            .code(),
            None
        );
        assert_eq!(ProviderError::Transport("reset".into()).code(), None);
    }

    #[test]
    fn display_names_the_code() {
        let err = ProviderError::coded("card_declined", "Your card was declined.");
        assert_eq!(
            err.to_string(),
            "provider rejected request (card_declined): Your card was declined."
        );
    }
}
