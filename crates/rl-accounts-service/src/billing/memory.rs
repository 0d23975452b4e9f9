//! In-process billing provider.
//!
//! Behaves like the Stripe sources and subscriptions APIs for the calls the
//! service makes: the first source attached to a customer becomes its default,
//! subscribing without a default source fails with `resource_missing`, and
//! unknown ids fail the same way. Used when no Stripe key is configured and
//! throughout the tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::errors::RESOURCE_MISSING;
use super::provider::{
    BillingProvider, ProviderCustomer, ProviderError, ProviderSource, ProviderSubscription,
};

/// Test card tokens and the cards they attach.
const TEST_TOKENS: &[(&str, &str, &str)] = &[
    ("tok_visa", "Visa", "4242"),
    ("tok_mastercard", "MasterCard", "4444"),
    ("tok_amex", "American Express", "0005"),
];

struct Customer {
    default_source: Option<String>,
    sources: Vec<ProviderSource>,
}

#[derive(Default)]
struct Inner {
    customers: HashMap<String, Customer>,
    subscriptions: Vec<ProviderSubscription>,
    next_id: u64,
    mutations: u64,
    pending_failure: Option<ProviderError>,
}

impl Inner {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{:08}", self.next_id)
    }

    /// Consume an injected failure, if any.
    fn begin_mutation(&mut self) -> Result<(), ProviderError> {
        if let Some(err) = self.pending_failure.take() {
            return Err(err);
        }
        Ok(())
    }

    fn customer_mut(&mut self, id: &str) -> Result<&mut Customer, ProviderError> {
        self.customers
            .get_mut(id)
            .ok_or_else(|| missing("customer", id))
    }
}

fn missing(kind: &str, id: &str) -> ProviderError {
    ProviderError::coded(RESOURCE_MISSING, format!("No such {kind}: '{id}'"))
}

/// A billing provider that keeps everything in memory.
#[derive(Default)]
pub struct InMemoryProvider {
    inner: Mutex<Inner>,
}

impl InMemoryProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next mutating call fail with `err`.
    ///
    /// Reads (customer retrieval, subscription listing) are never affected.
    pub fn inject_failure(&self, err: ProviderError) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.pending_failure = Some(err);
        }
    }

    /// Number of mutating calls that have succeeded.
    #[must_use]
    pub fn mutation_count(&self) -> u64 {
        self.inner.lock().map_or(0, |inner| inner.mutations)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, ProviderError> {
        self.inner
            .lock()
            .map_err(|_| ProviderError::Transport("in-memory provider lock poisoned".into()))
    }

    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut Inner) -> Result<T, ProviderError>,
    ) -> Result<T, ProviderError> {
        let mut inner = self.lock()?;
        inner.begin_mutation()?;
        let value = op(&mut *inner)?;
        inner.mutations += 1;
        Ok(value)
    }
}

#[async_trait]
impl BillingProvider for InMemoryProvider {
    async fn create_customer(&self, name: &str, email: &str) -> Result<String, ProviderError> {
        self.mutate(|inner| {
            let id = inner.next_id("cus");
            tracing::debug!(customer_id = %id, name, email, "In-memory customer created");
            inner.customers.insert(
                id.clone(),
                Customer {
                    default_source: None,
                    sources: Vec::new(),
                },
            );
            Ok(id)
        })
    }

    async fn delete_customer(&self, customer_id: &str) -> Result<(), ProviderError> {
        self.mutate(|inner| {
            inner
                .customers
                .remove(customer_id)
                .ok_or_else(|| missing("customer", customer_id))?;
            inner
                .subscriptions
                .retain(|sub| sub.customer_id != customer_id);
            Ok(())
        })
    }

    async fn retrieve_customer(
        &self,
        customer_id: &str,
    ) -> Result<ProviderCustomer, ProviderError> {
        let mut inner = self.lock()?;
        let customer = inner.customer_mut(customer_id)?;
        Ok(ProviderCustomer {
            id: customer_id.to_string(),
            default_source: customer.default_source.clone(),
            sources: customer.sources.clone(),
        })
    }

    async fn set_default_source(
        &self,
        customer_id: &str,
        source_id: &str,
    ) -> Result<(), ProviderError> {
        self.mutate(|inner| {
            let customer = inner.customer_mut(customer_id)?;
            if !customer.sources.iter().any(|s| s.id == source_id) {
                return Err(missing("source", source_id));
            }
            customer.default_source = Some(source_id.to_string());
            Ok(())
        })
    }

    async fn create_source(
        &self,
        customer_id: &str,
        token: &str,
    ) -> Result<ProviderSource, ProviderError> {
        self.mutate(|inner| {
            let id = inner.next_id("card");
            let (brand, last4) = TEST_TOKENS
                .iter()
                .find(|(t, _, _)| *t == token)
                .map_or(("Unknown", "0000"), |(_, brand, last4)| (*brand, *last4));

            let source = ProviderSource {
                id,
                kind: "card".into(),
                brand: brand.into(),
                exp_month: 12,
                exp_year: 2034,
                last4: last4.into(),
            };

            let customer = inner.customer_mut(customer_id)?;
            if customer.default_source.is_none() {
                customer.default_source = Some(source.id.clone());
            }
            customer.sources.push(source.clone());
            Ok(source)
        })
    }

    async fn delete_source(
        &self,
        customer_id: &str,
        source_id: &str,
    ) -> Result<(), ProviderError> {
        self.mutate(|inner| {
            let customer = inner.customer_mut(customer_id)?;
            let before = customer.sources.len();
            customer.sources.retain(|s| s.id != source_id);
            if customer.sources.len() == before {
                return Err(missing("source", source_id));
            }
            if customer.default_source.as_deref() == Some(source_id) {
                customer.default_source = customer.sources.first().map(|s| s.id.clone());
            }
            Ok(())
        })
    }

    async fn list_subscriptions(
        &self,
        customer_id: &str,
        max_records: usize,
    ) -> Result<Vec<ProviderSubscription>, ProviderError> {
        let inner = self.lock()?;
        if !inner.customers.contains_key(customer_id) {
            return Err(missing("customer", customer_id));
        }
        Ok(inner
            .subscriptions
            .iter()
            .filter(|sub| sub.customer_id == customer_id)
            .take(max_records)
            .cloned()
            .collect())
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        plan_id: &str,
    ) -> Result<ProviderSubscription, ProviderError> {
        self.mutate(|inner| {
            if inner.customer_mut(customer_id)?.default_source.is_none() {
                return Err(ProviderError::coded(
                    RESOURCE_MISSING,
                    "This customer has no attached payment source or default payment method.",
                ));
            }

            let created = i64::try_from(inner.next_id).unwrap_or(i64::MAX);
            let sub = ProviderSubscription {
                id: inner.next_id("sub"),
                customer_id: customer_id.to_string(),
                plan_id: Some(plan_id.to_string()),
                item_id: Some(inner.next_id("si")),
                created,
            };
            inner.subscriptions.push(sub.clone());
            Ok(sub)
        })
    }

    async fn update_subscription(
        &self,
        subscription: &ProviderSubscription,
        plan_id: &str,
    ) -> Result<ProviderSubscription, ProviderError> {
        self.mutate(|inner| {
            let sub = inner
                .subscriptions
                .iter_mut()
                .find(|s| s.id == subscription.id)
                .ok_or_else(|| missing("subscription", &subscription.id))?;
            sub.plan_id = Some(plan_id.to_string());
            Ok(sub.clone())
        })
    }

    async fn delete_subscription(&self, subscription_id: &str) -> Result<(), ProviderError> {
        self.mutate(|inner| {
            let before = inner.subscriptions.len();
            inner.subscriptions.retain(|s| s.id != subscription_id);
            if inner.subscriptions.len() == before {
                return Err(missing("subscription", subscription_id));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_source_becomes_default() {
        let provider = InMemoryProvider::new();
        let cus = provider.create_customer("A B", "a@b.co").await.unwrap();
        let first = provider.create_source(&cus, "tok_visa").await.unwrap();
        let second = provider.create_source(&cus, "tok_mastercard").await.unwrap();

        let customer = provider.retrieve_customer(&cus).await.unwrap();
        assert_eq!(customer.default_source.as_deref(), Some(first.id.as_str()));
        assert_eq!(customer.sources.len(), 2);
        assert_eq!(second.last4, "4444");
    }

    #[tokio::test]
    async fn deleting_default_promotes_next_source() {
        let provider = InMemoryProvider::new();
        let cus = provider.create_customer("A B", "a@b.co").await.unwrap();
        let first = provider.create_source(&cus, "tok_visa").await.unwrap();
        let second = provider.create_source(&cus, "tok_amex").await.unwrap();

        provider.delete_source(&cus, &first.id).await.unwrap();

        let customer = provider.retrieve_customer(&cus).await.unwrap();
        assert_eq!(customer.default_source, Some(second.id));
    }

    #[tokio::test]
    async fn unknown_ids_are_resource_missing() {
        let provider = InMemoryProvider::new();
        let err = provider.delete_customer("cus_nope").await.unwrap_err();
        assert_eq!(err.code(), Some(RESOURCE_MISSING));

        let cus = provider.create_customer("A B", "a@b.co").await.unwrap();
        let err = provider.set_default_source(&cus, "card_nope").await.unwrap_err();
        assert_eq!(err.code(), Some(RESOURCE_MISSING));

        let err = provider.delete_subscription("sub_nope").await.unwrap_err();
        assert_eq!(err.code(), Some(RESOURCE_MISSING));
    }

    #[tokio::test]
    async fn injected_failure_hits_next_mutation_only() {
        let provider = InMemoryProvider::new();
        let cus = provider.create_customer("A B", "a@b.co").await.unwrap();
        provider.inject_failure(ProviderError::Transport("boom".into()));

        // Reads pass through
        provider.retrieve_customer(&cus).await.unwrap();

        let err = provider.create_source(&cus, "tok_visa").await.unwrap_err();
        assert_eq!(err, ProviderError::Transport("boom".into()));
        provider.create_source(&cus, "tok_visa").await.unwrap();
        assert_eq!(provider.mutation_count(), 2);
    }

    #[tokio::test]
    async fn deleting_customer_drops_its_subscriptions() {
        let provider = InMemoryProvider::new();
        let cus = provider.create_customer("A B", "a@b.co").await.unwrap();
        provider.create_source(&cus, "tok_visa").await.unwrap();
        provider.create_subscription(&cus, "plan_x").await.unwrap();

        provider.delete_customer(&cus).await.unwrap();
        assert!(provider.list_subscriptions(&cus, 10).await.is_err());
    }
}
