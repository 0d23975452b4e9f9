//! Token exchange: a signed JWT for a fresh API key.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use rl_accounts_core::AccountId;

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticate request.
#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    /// HS256 token whose `sub` is the account id.
    pub token: String,
}

/// Authenticate response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateResponse {
    /// The authenticated account.
    pub account_id: String,
    /// A newly issued API key.
    pub api_key: String,
}

/// Claims read from the token.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Account id.
    pub sub: String,
    /// Expiry (Unix seconds).
    pub exp: i64,
}

/// Exchange a token for a new API key.
///
/// Every token or account problem is a `401`. Only a failing store is a `500`.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AuthenticateRequest>,
) -> Result<Json<AuthenticateResponse>, ApiError> {
    let secret = state.config.jwt_secret.as_deref().ok_or_else(|| {
        tracing::warn!("JWT_SECRET not configured - rejecting token exchange");
        ApiError::Unauthorized
    })?;

    let claims = validate_token(&body.token, secret)?;
    let account_id: AccountId = claims.sub.parse().map_err(|_| {
        tracing::debug!(sub = %claims.sub, "Token subject is not an account id");
        ApiError::Unauthorized
    })?;

    let mut account = state.store.get_account(&account_id)?.ok_or_else(|| {
        tracing::debug!(account_id = %account_id, "Token for unknown account");
        ApiError::Unauthorized
    })?;

    let api_key = account.issue_api_key();
    state.store.put_account(&account)?;

    tracing::info!(account_id = %account.id, "API key issued");

    Ok(Json(AuthenticateResponse {
        account_id: account.id.to_string(),
        api_key: api_key.expose().to_string(),
    }))
}

fn validate_token(token: &str, secret: &str) -> Result<TokenClaims, ApiError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        ApiError::Unauthorized
    })?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, sub: &str, exp: i64) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &TokenClaims {
                sub: sub.into(),
                exp,
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_an_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn accepts_token_signed_with_secret() {
        let claims = validate_token(&token("s3cret", "abc", in_an_hour()), "s3cret").unwrap();
        assert_eq!(claims.sub, "abc");
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        assert!(matches!(
            validate_token(&token("other", "abc", in_an_hour()), "s3cret"),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            validate_token(&token("s3cret", "abc", 1_000), "s3cret"),
            Err(ApiError::Unauthorized)
        ));
    }
}
