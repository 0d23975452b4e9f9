//! Application state.

use std::sync::Arc;

use rl_accounts_store::{PlanCatalog, Store};

use crate::billing::{BillingAdapter, BillingProvider, InMemoryProvider, SubscriptionReconciler};
use crate::config::ServiceConfig;
use crate::stripe::StripeClient;
use crate::upstream::UpstreamClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: ServiceConfig,

    /// Account storage.
    pub store: Arc<dyn Store>,

    /// The internal plan catalog.
    pub plans: Arc<dyn PlanCatalog>,

    /// Customer and payment-method operations.
    pub billing: BillingAdapter,

    /// Subscription reads and changes.
    pub subscriptions: Arc<SubscriptionReconciler>,

    /// Upstream users API client (optional).
    pub upstream: Option<UpstreamClient>,
}

impl AppState {
    /// Create application state, talking to Stripe when a key is configured.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, plans: Arc<dyn PlanCatalog>, config: ServiceConfig) -> Self {
        let stripe = config.stripe_api_key.as_ref().and_then(|key| {
            match StripeClient::new(key) {
                Ok(client) => {
                    tracing::info!(api_base = %config.stripe_api_base, "Stripe integration enabled");
                    Some(
                        client
                            .with_base_url(&config.stripe_api_base)
                            .with_api_version(config.stripe_api_version.clone()),
                    )
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Stripe client");
                    None
                }
            }
        });

        let provider: Arc<dyn BillingProvider> = match stripe {
            Some(client) => Arc::new(client),
            None => {
                tracing::warn!("Stripe not configured - using the in-memory billing provider");
                Arc::new(InMemoryProvider::new())
            }
        };

        Self::with_provider(store, plans, provider, config)
    }

    /// Create application state around an explicit billing provider.
    #[must_use]
    pub fn with_provider(
        store: Arc<dyn Store>,
        plans: Arc<dyn PlanCatalog>,
        provider: Arc<dyn BillingProvider>,
        config: ServiceConfig,
    ) -> Self {
        let upstream = config.upstream_url.as_ref().and_then(|url| {
            match UpstreamClient::new(url, config.upstream_api_key.clone()) {
                Ok(client) => {
                    tracing::info!(upstream_url = %url, "Upstream users API enabled");
                    Some(client)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create upstream client");
                    None
                }
            }
        });

        if upstream.is_none() {
            tracing::warn!("Upstream users API not configured - /api/proxy/users will fail");
        }

        Self {
            billing: BillingAdapter::new(Arc::clone(&provider)),
            subscriptions: Arc::new(SubscriptionReconciler::new(provider, Arc::clone(&plans))),
            config,
            store,
            plans,
            upstream,
        }
    }
}
