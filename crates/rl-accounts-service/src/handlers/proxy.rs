//! Upstream users proxy.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::error::ApiError;
use crate::state::AppState;

/// Forward a user creation to the upstream users API.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let upstream = state
        .upstream
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Upstream users API not configured".into()))?;

    let (status, payload) = upstream.create_user(&body).await.map_err(|e| {
        tracing::warn!(error = %e, "Upstream user create failed");
        ApiError::ExternalService("Upstream users API unavailable".into())
    })?;

    Ok((status, Json(payload)))
}
