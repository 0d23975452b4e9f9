//! Stripe API types.
//!
//! Only the fields the service reads are modelled.

use serde::Deserialize;

/// Stripe customer object, retrieved with `expand[]=sources`.
#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    /// Stripe customer ID.
    pub id: String,
    /// ID of the default payment source.
    #[serde(default)]
    pub default_source: Option<String>,
    /// Attached payment sources.
    #[serde(default)]
    pub sources: Option<StripeList<Source>>,
}

/// A payment source attached to a customer.
///
/// Card fields are absent for other source kinds.
#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    /// Source ID.
    pub id: String,
    /// Object type (`card`, `bank_account`, `source`, ...).
    pub object: String,
    /// Card brand.
    #[serde(default)]
    pub brand: Option<String>,
    /// Expiry month.
    #[serde(default)]
    pub exp_month: Option<u32>,
    /// Expiry year.
    #[serde(default)]
    pub exp_year: Option<u32>,
    /// Last four digits.
    #[serde(default)]
    pub last4: Option<String>,
}

/// Stripe plan reference.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanRef {
    /// Plan ID.
    pub id: String,
}

/// Stripe subscription item.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
    /// Item ID.
    pub id: String,
    /// Plan on this item.
    #[serde(default)]
    pub plan: Option<PlanRef>,
}

/// Stripe subscription object.
#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    /// Subscription ID.
    pub id: String,
    /// Owning customer ID.
    pub customer: String,
    /// Created timestamp (Unix).
    #[serde(default)]
    pub created: i64,
    /// Plan, present on single-plan subscriptions.
    #[serde(default)]
    pub plan: Option<PlanRef>,
    /// Subscription items.
    #[serde(default)]
    pub items: Option<StripeList<SubscriptionItem>>,
}

impl Subscription {
    /// The first subscription item, which carries the plan.
    #[must_use]
    pub fn first_item(&self) -> Option<&SubscriptionItem> {
        self.items.as_ref().and_then(|items| items.data.first())
    }

    /// Plan ID, preferring the first item's plan.
    #[must_use]
    pub fn plan_id(&self) -> Option<&str> {
        self.first_item()
            .and_then(|item| item.plan.as_ref())
            .or(self.plan.as_ref())
            .map(|plan| plan.id.as_str())
    }
}

/// Stripe list response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeList<T> {
    /// Data items.
    pub data: Vec<T>,
    /// Whether there are more items.
    #[serde(default)]
    pub has_more: bool,
}

/// Response to a delete call.
#[derive(Debug, Clone, Deserialize)]
pub struct Deleted {
    /// Deleted object ID.
    pub id: String,
    /// Always true on success.
    #[serde(default)]
    pub deleted: bool,
}

/// Stripe webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Event ID.
    pub id: String,
    /// Event type (e.g., "customer.subscription.updated").
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event data.
    pub data: WebhookEventData,
    /// Created timestamp (Unix).
    #[serde(default)]
    pub created: i64,
}

/// Webhook event data container.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    /// The event object.
    pub object: serde_json::Value,
}

/// Stripe error response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    /// Error details.
    pub error: StripeErrorDetail,
}

/// Stripe error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    /// Error type (`card_error`, `invalid_request_error`, `api_error`, ...).
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Issuer decline code, on card errors.
    #[serde(default)]
    pub decline_code: Option<String>,
}
