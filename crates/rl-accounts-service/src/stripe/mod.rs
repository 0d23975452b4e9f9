//! Stripe integration.
//!
//! Stripe handles:
//! - Customer registration
//! - Card sources and the default source
//! - Subscriptions to catalog plans
//! - Webhook signature verification

pub mod client;
pub mod provider;
pub mod types;

pub use client::{verify_webhook_signature, StripeClient, StripeError};
pub use types::*;
