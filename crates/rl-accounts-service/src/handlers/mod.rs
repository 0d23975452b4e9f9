//! API handlers.

pub mod accounts;
pub mod authenticate;
pub mod health;
pub mod payment_methods;
pub mod plans;
pub mod proxy;
