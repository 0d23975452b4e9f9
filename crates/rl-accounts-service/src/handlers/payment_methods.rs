//! Payment method handlers.
//!
//! The billing provider holds the cards; these routes relay to it for the
//! caller's own customer.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use rl_accounts_core::PaymentMethod;

use super::accounts::load_owned_account;
use crate::admission::AccountAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Create payment method request.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentMethodRequest {
    /// Card token from the provider's client-side library.
    pub token: String,
}

/// List the account's cards.
pub async fn list_payment_methods(
    State(state): State<Arc<AppState>>,
    auth: AccountAuth,
    Path(account_id): Path<String>,
) -> Result<Json<Vec<PaymentMethod>>, ApiError> {
    let account = load_owned_account(&state, &auth, &account_id)?;
    let methods = state.billing.get_payment_methods(&account.billing_id).await?;
    Ok(Json(methods))
}

/// Attach a card to the account.
pub async fn create_payment_method(
    State(state): State<Arc<AppState>>,
    auth: AccountAuth,
    Path(account_id): Path<String>,
    Json(body): Json<CreatePaymentMethodRequest>,
) -> Result<(StatusCode, Json<PaymentMethod>), ApiError> {
    if body.token.trim().is_empty() {
        return Err(ApiError::BadRequest("token must not be empty".into()));
    }

    let account = load_owned_account(&state, &auth, &account_id)?;
    let method = state
        .billing
        .create_payment_method(&account.billing_id, &body.token)
        .await?;

    Ok((StatusCode::CREATED, Json(method)))
}

/// Remove a card.
pub async fn delete_payment_method(
    State(state): State<Arc<AppState>>,
    auth: AccountAuth,
    Path((account_id, method_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let account = load_owned_account(&state, &auth, &account_id)?;
    state
        .billing
        .delete_payment_method(&account.billing_id, &method_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Make a card the account's default.
pub async fn set_default_payment_method(
    State(state): State<Arc<AppState>>,
    auth: AccountAuth,
    Path((account_id, method_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let account = load_owned_account(&state, &auth, &account_id)?;
    state
        .billing
        .set_default_payment_method(&account.billing_id, &method_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
