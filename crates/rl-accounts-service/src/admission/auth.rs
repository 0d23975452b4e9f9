//! API-key authentication.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use rl_accounts_core::{AccountId, ApiKey};

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// An account authenticated by its API key.
///
/// Extracting this rejects with `401` when the header is missing, before any
/// store access, and when the key is unknown. A failing store lookup is a
/// `500`.
#[derive(Debug, Clone)]
pub struct AccountAuth {
    /// The authenticated account.
    pub account_id: AccountId,
}

impl AccountAuth {
    /// Require that the path's `:accountId` is the caller's own account.
    ///
    /// A malformed id cannot be the caller's and is rejected the same way.
    pub fn ensure_owns(&self, account_id: &str) -> Result<AccountId, ApiError> {
        match account_id.parse::<AccountId>() {
            Ok(id) if id == self.account_id => Ok(id),
            _ => {
                tracing::debug!(
                    caller = %self.account_id,
                    requested = account_id,
                    "Account access denied"
                );
                Err(ApiError::Forbidden)
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AccountAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<Self>() {
            return Ok(auth.clone());
        }

        let key = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(ApiKey::from_header)
            .ok_or(ApiError::Unauthorized)?;

        let account = state
            .store
            .find_account_by_api_key(&key.digest())
            .map_err(|e| ApiError::Internal(format!("API key lookup failed: {e}")))?
            .ok_or_else(|| {
                tracing::debug!("Unknown API key");
                ApiError::Unauthorized
            })?;

        let auth = Self {
            account_id: account.id,
        };
        parts.extensions.insert(auth.clone());
        Ok(auth)
    }
}

/// Authenticate before anything else inspects the request.
///
/// Layered over account routes so a missing or unknown key is a `401` ahead
/// of body checks. The handler's own [`AccountAuth`] reuses the cached result.
pub async fn require_account(_auth: AccountAuth, request: Request, next: Next) -> Response {
    next.run(request).await
}
