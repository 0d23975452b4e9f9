//! rl-accounts HTTP API service.
//!
//! This crate provides the HTTP API for rl-accounts, including:
//!
//! - Account registration and profile updates
//! - Payment methods, held at the billing provider
//! - Plan subscriptions, reconciled against the provider on every change
//! - Stripe and routerlimits webhooks
//!
//! # Authentication
//!
//! Account-scoped routes take an API key in `x-api-key`. Keys are issued on
//! registration and by `/api/authenticate`, which exchanges a signed JWT for a
//! new key.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the Handler trait

pub mod admission;
pub mod billing;
pub mod catalog;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod stripe;
pub mod upstream;
pub mod webhooks;

pub use billing::{BillingProvider, InMemoryProvider};
pub use catalog::seed_plans;
pub use config::{AllowedOrigins, ServiceConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{StripeClient, StripeError};
