//! Customer and payment-method operations.
//!
//! A thin channel to the provider: results are normalized into
//! [`PaymentMethod`] records, failures pass through untranslated.

use std::sync::Arc;

use rl_accounts_core::{CardInfo, PaymentMethod};

use super::provider::{BillingProvider, ProviderError, ProviderSource};

/// Source kind this service exposes.
const CARD: &str = "card";

/// Customer and payment-method operations against the billing provider.
#[derive(Clone)]
pub struct BillingAdapter {
    provider: Arc<dyn BillingProvider>,
}

impl BillingAdapter {
    /// Wrap a provider.
    #[must_use]
    pub fn new(provider: Arc<dyn BillingProvider>) -> Self {
        Self { provider }
    }

    /// Create a provider customer and return its id.
    ///
    /// # Errors
    ///
    /// Returns the provider failure unchanged.
    pub async fn create_customer(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Result<String, ProviderError> {
        let name = format!("{first_name} {last_name}");
        let id = self.provider.create_customer(&name, email).await?;
        tracing::info!(customer_id = %id, "Billing customer created");
        Ok(id)
    }

    /// Delete a provider customer.
    ///
    /// # Errors
    ///
    /// Fails if the customer does not exist.
    pub async fn delete_customer(&self, customer_id: &str) -> Result<(), ProviderError> {
        self.provider.delete_customer(customer_id).await?;
        tracing::info!(customer_id, "Billing customer deleted");
        Ok(())
    }

    /// Attach a tokenized card and return it as a payment method.
    ///
    /// # Errors
    ///
    /// Returns the provider failure unchanged.
    pub async fn create_payment_method(
        &self,
        customer_id: &str,
        token: &str,
    ) -> Result<PaymentMethod, ProviderError> {
        let source = self.provider.create_source(customer_id, token).await?;
        let customer = self.provider.retrieve_customer(customer_id).await?;
        let is_default = customer.default_source.as_deref() == Some(source.id.as_str());

        tracing::info!(customer_id, source_id = %source.id, is_default, "Payment method added");
        Ok(to_payment_method(source, is_default))
    }

    /// The customer's cards, in provider order.
    ///
    /// # Errors
    ///
    /// Returns the provider failure unchanged.
    pub async fn get_payment_methods(
        &self,
        customer_id: &str,
    ) -> Result<Vec<PaymentMethod>, ProviderError> {
        let customer = self.provider.retrieve_customer(customer_id).await?;
        let default_source = customer.default_source;

        Ok(customer
            .sources
            .into_iter()
            .filter(|source| source.kind == CARD)
            .map(|source| {
                let is_default = default_source.as_deref() == Some(source.id.as_str());
                to_payment_method(source, is_default)
            })
            .collect())
    }

    /// Detach a payment method.
    ///
    /// # Errors
    ///
    /// Returns the provider failure unchanged.
    pub async fn delete_payment_method(
        &self,
        customer_id: &str,
        method_id: &str,
    ) -> Result<(), ProviderError> {
        self.provider.delete_source(customer_id, method_id).await?;
        tracing::info!(customer_id, source_id = method_id, "Payment method removed");
        Ok(())
    }

    /// Make `method_id` the customer's default.
    ///
    /// Ownership of `method_id` is only checked as far as the provider checks
    /// it.
    ///
    /// # Errors
    ///
    /// Returns the provider failure unchanged.
    pub async fn set_default_payment_method(
        &self,
        customer_id: &str,
        method_id: &str,
    ) -> Result<(), ProviderError> {
        self.provider.set_default_source(customer_id, method_id).await
    }
}

fn to_payment_method(source: ProviderSource, is_default: bool) -> PaymentMethod {
    PaymentMethod {
        id: source.id,
        is_default,
        card_info: CardInfo {
            brand: source.brand,
            exp_month: source.exp_month,
            exp_year: source.exp_year,
            last4: source.last4,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::memory::InMemoryProvider;

    async fn adapter_with_customer() -> (BillingAdapter, String) {
        let adapter = BillingAdapter::new(Arc::new(InMemoryProvider::new()));
        let customer = adapter
            .create_customer("Grace", "Hopper", "grace@example.com")
            .await
            .unwrap();
        (adapter, customer)
    }

    fn defaults(methods: &[PaymentMethod]) -> Vec<&str> {
        methods
            .iter()
            .filter(|m| m.is_default)
            .map(|m| m.id.as_str())
            .collect()
    }

    #[tokio::test]
    async fn first_method_is_default_second_is_not() {
        let (adapter, customer) = adapter_with_customer().await;

        let first = adapter.create_payment_method(&customer, "tok_visa").await.unwrap();
        assert!(first.is_default);
        assert_eq!(first.card_info.last4, "4242");

        let second = adapter
            .create_payment_method(&customer, "tok_mastercard")
            .await
            .unwrap();
        assert!(!second.is_default);

        let methods = adapter.get_payment_methods(&customer).await.unwrap();
        assert_eq!(methods.len(), 2);
        assert_eq!(defaults(&methods), vec![first.id.as_str()]);
    }

    #[tokio::test]
    async fn set_default_leaves_exactly_one_default() {
        let (adapter, customer) = adapter_with_customer().await;
        adapter.create_payment_method(&customer, "tok_visa").await.unwrap();
        let second = adapter.create_payment_method(&customer, "tok_amex").await.unwrap();

        adapter
            .set_default_payment_method(&customer, &second.id)
            .await
            .unwrap();

        let methods = adapter.get_payment_methods(&customer).await.unwrap();
        assert_eq!(defaults(&methods), vec![second.id.as_str()]);
    }

    #[tokio::test]
    async fn delete_removes_method() {
        let (adapter, customer) = adapter_with_customer().await;
        let method = adapter.create_payment_method(&customer, "tok_visa").await.unwrap();

        adapter.delete_payment_method(&customer, &method.id).await.unwrap();

        assert!(adapter.get_payment_methods(&customer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_unknown_customer_fails() {
        let adapter = BillingAdapter::new(Arc::new(InMemoryProvider::new()));
        let err = adapter.delete_customer("cus_missing").await.unwrap_err();
        assert_eq!(err.code(), Some("resource_missing"));
    }
}
