//! The request admission pipeline.
//!
//! Every request passes these checks before a handler runs:
//!
//! 1. [`access_log::no_cache_and_log`] on all routes
//! 2. [`cors::cors_wrangler`] on the `/api` routes
//! 3. [`auth::require_account`] on account-scoped routes
//! 4. the route's [`body::BodyMode`]
//!
//! Handlers then extract [`auth::AccountAuth`] from the request again; the
//! lookup is cached in the request extensions.

pub mod access_log;
pub mod auth;
pub mod body;
pub mod cors;

pub use access_log::no_cache_and_log;
pub use auth::{require_account, AccountAuth, API_KEY_HEADER};
pub use body::BodyMode;
pub use cors::cors_wrangler;
