//! Account handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

use rl_accounts_core::Account;

use crate::admission::AccountAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Account as returned to callers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    /// Account ID.
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email.
    pub email: String,
    /// Internal id of the subscribed plan, if any.
    pub plan_id: Option<String>,
    /// Created timestamp.
    pub created_at: String,
    /// Updated timestamp.
    pub updated_at: String,
}

impl AccountView {
    fn new(account: &Account, plan_id: Option<String>) -> Self {
        Self {
            id: account.id.to_string(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            plan_id,
            created_at: account.created_at.to_rfc3339(),
            updated_at: account.updated_at.to_rfc3339(),
        }
    }
}

/// Create account request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email.
    pub email: String,
}

/// Create account response. The API key is only ever shown here.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountResponse {
    /// The new account.
    pub account: AccountView,
    /// The account's first API key.
    pub api_key: String,
}

/// Update account request.
///
/// `planId` distinguishes absent (leave the subscription alone) from `null`
/// (cancel it).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New contact email.
    pub email: Option<String>,
    /// Plan change.
    #[serde(default, deserialize_with = "present")]
    pub plan_id: Option<Option<String>>,
}

/// Map a present field (including `null`) to `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Register a new account.
///
/// The billing customer is created first; if the account cannot be stored
/// afterwards the customer is removed again.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<CreateAccountResponse>), ApiError> {
    // Validate before anything is created at the provider
    Account::new("", &body.first_name, &body.last_name, &body.email)?;

    let customer_id = state
        .billing
        .create_customer(&body.first_name, &body.last_name, &body.email)
        .await?;

    let mut account = Account::new(&customer_id, body.first_name, body.last_name, body.email)?;
    let api_key = account.issue_api_key();

    if let Err(e) = state.store.put_account(&account) {
        if let Err(cleanup) = state.billing.delete_customer(&customer_id).await {
            tracing::error!(
                customer_id = %customer_id,
                error = %cleanup,
                "Failed to remove billing customer after store failure"
            );
        }
        return Err(e.into());
    }

    tracing::info!(
        account_id = %account.id,
        customer_id = %customer_id,
        "Account created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateAccountResponse {
            account: AccountView::new(&account, None),
            api_key: api_key.expose().to_string(),
        }),
    ))
}

/// Get an account, including its current plan.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    auth: AccountAuth,
    Path(account_id): Path<String>,
) -> Result<Json<AccountView>, ApiError> {
    let account = load_owned_account(&state, &auth, &account_id)?;
    let plan_id = current_plan_id(&state, &account).await?;
    Ok(Json(AccountView::new(&account, plan_id)))
}

/// Update profile fields and/or change the plan.
///
/// Profile fields are validated before the plan change, and the account is
/// only persisted once the plan change has succeeded.
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    auth: AccountAuth,
    Path(account_id): Path<String>,
    Json(body): Json<UpdateAccountRequest>,
) -> Result<Json<AccountView>, ApiError> {
    let mut account = load_owned_account(&state, &auth, &account_id)?;

    let mut profile_changed = false;
    if let Some(first_name) = body.first_name {
        account.first_name = first_name;
        profile_changed = true;
    }
    if let Some(last_name) = body.last_name {
        account.last_name = last_name;
        profile_changed = true;
    }
    if let Some(email) = body.email {
        account.email = email;
        profile_changed = true;
    }
    account.validate()?;

    let plan_id = match body.plan_id {
        None => current_plan_id(&state, &account).await?,
        Some(None) => {
            state.subscriptions.cancel(&account.billing_id).await?;
            tracing::info!(account_id = %account.id, "Subscription cancelled");
            None
        }
        Some(Some(plan_id)) => {
            let plan = state
                .plans
                .get_plan(&plan_id)?
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown plan: {plan_id}")))?;
            state
                .subscriptions
                .subscribe(&account.billing_id, &plan.billing_id)
                .await?;
            tracing::info!(account_id = %account.id, plan_id = %plan.id, "Plan changed");
            Some(plan.id)
        }
    };

    if profile_changed {
        account.updated_at = Utc::now();
        state.store.put_account(&account)?;
    }

    Ok(Json(AccountView::new(&account, plan_id)))
}

/// Load the caller's own account.
pub(crate) fn load_owned_account(
    state: &AppState,
    auth: &AccountAuth,
    account_id: &str,
) -> Result<Account, ApiError> {
    let id = auth.ensure_owns(account_id)?;
    state
        .store
        .get_account(&id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))
}

/// Internal id of the plan the account is subscribed to.
async fn current_plan_id(state: &AppState, account: &Account) -> Result<Option<String>, ApiError> {
    let Some(billing_plan) = state.subscriptions.get(&account.billing_id).await? else {
        return Ok(None);
    };
    Ok(state
        .plans
        .get_by_billing_id(&billing_plan)?
        .map(|plan| plan.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_id_absent_null_and_set_are_distinct() {
        let absent: UpdateAccountRequest = serde_json::from_str(r#"{"firstName":"Ada"}"#).unwrap();
        assert_eq!(absent.plan_id, None);

        let null: UpdateAccountRequest = serde_json::from_str(r#"{"planId":null}"#).unwrap();
        assert_eq!(null.plan_id, Some(None));

        let set: UpdateAccountRequest = serde_json::from_str(r#"{"planId":"pro"}"#).unwrap();
        assert_eq!(set.plan_id, Some(Some("pro".into())));
    }

    #[test]
    fn view_hides_billing_fields() {
        let mut account = Account::new("cus_1", "Ada", "Lovelace", "ada@example.com").unwrap();
        account.issue_api_key();
        let json = serde_json::to_value(AccountView::new(&account, Some("basic".into()))).unwrap();
        assert_eq!(json["planId"], "basic");
        assert_eq!(json["firstName"], "Ada");
        assert!(json.get("billingId").is_none());
        assert!(json.get("apiKeyDigests").is_none());
    }
}
