//! Billing: the provider boundary, customer and payment-method operations, and
//! subscription reconciliation.

pub mod errors;
pub mod locks;
pub mod memory;
pub mod payment_methods;
pub mod provider;
pub mod reconciler;

pub use locks::CustomerLocks;
pub use memory::InMemoryProvider;
pub use payment_methods::BillingAdapter;
pub use provider::{
    BillingProvider, ProviderCustomer, ProviderError, ProviderSource, ProviderSubscription,
};
pub use reconciler::{ReconcileError, SubscriptionReconciler, SUBSCRIPTION_FETCH_LIMIT};
