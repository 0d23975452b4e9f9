//! [`BillingProvider`] on top of the Stripe REST client.

use async_trait::async_trait;

use super::client::{StripeClient, StripeError};
use super::types::{Source, Subscription};
use crate::billing::{
    BillingProvider, ProviderCustomer, ProviderError, ProviderSource, ProviderSubscription,
};

impl From<StripeError> for ProviderError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::Api { code, message, .. } => Self::Rejected { code, message },
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<Source> for ProviderSource {
    fn from(source: Source) -> Self {
        Self {
            id: source.id,
            kind: source.object,
            brand: source.brand.unwrap_or_default(),
            exp_month: source.exp_month.unwrap_or_default(),
            exp_year: source.exp_year.unwrap_or_default(),
            last4: source.last4.unwrap_or_default(),
        }
    }
}

impl From<Subscription> for ProviderSubscription {
    fn from(sub: Subscription) -> Self {
        Self {
            plan_id: sub.plan_id().map(str::to_string),
            item_id: sub.first_item().map(|item| item.id.clone()),
            id: sub.id,
            customer_id: sub.customer,
            created: sub.created,
        }
    }
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn create_customer(&self, name: &str, email: &str) -> Result<String, ProviderError> {
        Ok(StripeClient::create_customer(self, name, email).await?.id)
    }

    async fn delete_customer(&self, customer_id: &str) -> Result<(), ProviderError> {
        StripeClient::delete_customer(self, customer_id).await?;
        Ok(())
    }

    async fn retrieve_customer(
        &self,
        customer_id: &str,
    ) -> Result<ProviderCustomer, ProviderError> {
        let customer = self.get_customer(customer_id).await?;
        Ok(ProviderCustomer {
            id: customer.id,
            default_source: customer.default_source,
            sources: customer
                .sources
                .map(|list| list.data.into_iter().map(Into::into).collect())
                .unwrap_or_default(),
        })
    }

    async fn set_default_source(
        &self,
        customer_id: &str,
        source_id: &str,
    ) -> Result<(), ProviderError> {
        StripeClient::set_default_source(self, customer_id, source_id).await?;
        Ok(())
    }

    async fn create_source(
        &self,
        customer_id: &str,
        token: &str,
    ) -> Result<ProviderSource, ProviderError> {
        Ok(StripeClient::create_source(self, customer_id, token)
            .await?
            .into())
    }

    async fn delete_source(
        &self,
        customer_id: &str,
        source_id: &str,
    ) -> Result<(), ProviderError> {
        StripeClient::delete_source(self, customer_id, source_id).await?;
        Ok(())
    }

    async fn list_subscriptions(
        &self,
        customer_id: &str,
        max_records: usize,
    ) -> Result<Vec<ProviderSubscription>, ProviderError> {
        Ok(StripeClient::list_subscriptions(self, customer_id, max_records)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        plan_id: &str,
    ) -> Result<ProviderSubscription, ProviderError> {
        Ok(StripeClient::create_subscription(self, customer_id, plan_id)
            .await?
            .into())
    }

    async fn update_subscription(
        &self,
        subscription: &ProviderSubscription,
        plan_id: &str,
    ) -> Result<ProviderSubscription, ProviderError> {
        Ok(StripeClient::update_subscription(
            self,
            &subscription.id,
            subscription.item_id.as_deref(),
            plan_id,
        )
        .await?
        .into())
    }

    async fn delete_subscription(&self, subscription_id: &str) -> Result<(), ProviderError> {
        StripeClient::delete_subscription(self, subscription_id).await?;
        Ok(())
    }
}
