//! Subscription reconciliation.
//!
//! A customer's provider account may hold subscriptions that belong to other
//! systems. The subscription this service owns is the first one, in provider
//! list order, whose plan resolves in the plan catalog. Nothing about it is
//! stored locally: every operation rediscovers it from the provider.
//!
//! ```text
//! NONE ──subscribe(p)──▶ ACTIVE(p) ──subscribe(q)──▶ ACTIVE(q)
//!   ▲                        │
//!   └────────cancel──────────┘
//! ```

use std::sync::Arc;

use rl_accounts_core::InternalErrorKind;
use rl_accounts_store::{PlanCatalog, StoreError};

use super::errors::classify;
use super::locks::CustomerLocks;
use super::provider::{BillingProvider, ProviderError, ProviderSubscription};

/// Upper bound on the subscriptions fetched for one customer.
pub const SUBSCRIPTION_FETCH_LIMIT: usize = 1000;

/// Errors raised while reconciling a customer's subscription.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The provider refused the change for a reason the caller can fix.
    #[error("subscription change declined: {0}")]
    Declined(InternalErrorKind),

    /// The provider failed without a business meaning.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The plan catalog could not be read.
    #[error("plan catalog error: {0}")]
    Catalog(#[from] StoreError),
}

/// Keeps each customer on at most one owned subscription.
///
/// Plan ids taken and returned here are provider plan ids.
pub struct SubscriptionReconciler {
    provider: Arc<dyn BillingProvider>,
    plans: Arc<dyn PlanCatalog>,
    locks: CustomerLocks,
}

impl SubscriptionReconciler {
    /// Create a reconciler over `provider`, recognizing plans in `plans`.
    #[must_use]
    pub fn new(provider: Arc<dyn BillingProvider>, plans: Arc<dyn PlanCatalog>) -> Self {
        Self {
            provider,
            plans,
            locks: CustomerLocks::new(),
        }
    }

    /// The provider plan id of the customer's owned subscription, if any.
    ///
    /// # Errors
    ///
    /// Returns provider and catalog failures unchanged.
    pub async fn get(&self, customer_id: &str) -> Result<Option<String>, ReconcileError> {
        Ok(self
            .find_our_subscription(customer_id)
            .await?
            .and_then(|sub| sub.plan_id))
    }

    /// Put the customer on `plan_id`, creating or moving the owned
    /// subscription as needed. Already being on `plan_id` is a no-op.
    ///
    /// # Errors
    ///
    /// Coded provider refusals become [`ReconcileError::Declined`]; uncoded
    /// failures are returned as [`ReconcileError::Provider`].
    pub async fn subscribe(&self, customer_id: &str, plan_id: &str) -> Result<(), ReconcileError> {
        let _guard = self.locks.acquire(customer_id).await;

        let existing = self.find_our_subscription(customer_id).await?;
        let outcome = match existing {
            Some(sub) if sub.plan_id.as_deref() == Some(plan_id) => {
                tracing::debug!(customer_id, plan_id, "Subscription already on plan");
                return Ok(());
            }
            Some(sub) if sub.plan_id.is_some() => {
                tracing::info!(
                    customer_id,
                    subscription_id = %sub.id,
                    from = ?sub.plan_id,
                    to = plan_id,
                    "Changing subscription plan"
                );
                self.provider.update_subscription(&sub, plan_id).await
            }
            _ => {
                tracing::info!(customer_id, plan_id, "Creating subscription");
                self.provider.create_subscription(customer_id, plan_id).await
            }
        };

        outcome.map(|_| ()).map_err(|err| match classify(&err) {
            Some(kind) => {
                tracing::info!(customer_id, plan_id, error = %err, kind = %kind, "Subscription change declined");
                ReconcileError::Declined(kind)
            }
            None => ReconcileError::Provider(err),
        })
    }

    /// Delete the customer's owned subscription. Having none is a no-op.
    ///
    /// # Errors
    ///
    /// Returns provider and catalog failures unchanged.
    pub async fn cancel(&self, customer_id: &str) -> Result<(), ReconcileError> {
        let _guard = self.locks.acquire(customer_id).await;

        let Some(sub) = self
            .find_our_subscription(customer_id)
            .await?
            .filter(|sub| sub.plan_id.is_some())
        else {
            tracing::debug!(customer_id, "No subscription to cancel");
            return Ok(());
        };

        tracing::info!(customer_id, subscription_id = %sub.id, "Cancelling subscription");
        self.provider.delete_subscription(&sub.id).await?;
        Ok(())
    }

    /// Find the first subscription, in provider order, whose plan is in the
    /// catalog.
    async fn find_our_subscription(
        &self,
        customer_id: &str,
    ) -> Result<Option<ProviderSubscription>, ReconcileError> {
        let subscriptions = self
            .provider
            .list_subscriptions(customer_id, SUBSCRIPTION_FETCH_LIMIT)
            .await?;

        for sub in subscriptions {
            let Some(plan_id) = sub.plan_id.as_deref() else {
                continue;
            };
            if self.plans.get_by_billing_id(plan_id)?.is_some() {
                return Ok(Some(sub));
            }
        }

        Ok(None)
    }
}
