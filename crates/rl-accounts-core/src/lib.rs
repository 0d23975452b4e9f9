//! Core types and utilities for rl-accounts.
//!
//! This crate provides the foundational types shared by the store and the HTTP
//! service:
//!
//! - **Identifiers**: `AccountId`, `ApiKey`
//! - **Accounts**: `Account`
//! - **Plans**: `Plan`, the internal record a provider plan id resolves to
//! - **Payments**: `PaymentMethod`, `CardInfo`
//! - **Errors**: `InternalErrorKind`, the stable business error values returned
//!   to callers regardless of provider wording

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod error;
pub mod ids;
pub mod payment;
pub mod plan;

pub use account::{Account, MAX_API_KEYS};
pub use error::{CoreError, InternalErrorKind, Result};
pub use ids::{AccountId, ApiKey, IdError};
pub use payment::{CardInfo, PaymentMethod};
pub use plan::Plan;
