//! Webhook receivers.
//!
//! Webhook routes take their body raw. A [`WebhookReceiver`] first verifies the
//! signature over the exact bytes, then parses and dispatches the payload.

pub mod billing;
pub mod routerlimits;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use crate::error::ApiError;

pub use billing::StripeWebhookReceiver;
pub use routerlimits::RouterLimitsWebhookReceiver;

/// Webhook failures. Both are the sender's fault and answered with `400`.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Missing or wrong signature.
    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),

    /// Body is not the expected payload.
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// A webhook source.
#[async_trait]
pub trait WebhookReceiver: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Check the request signature over the raw body.
    fn verify(&self, headers: &HeaderMap, raw: &[u8]) -> Result<(), WebhookError>;

    /// Parse and act on a verified payload.
    async fn dispatch(&self, raw: &[u8]) -> Result<(), WebhookError>;
}

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was processed.
    pub received: bool,
}

/// Receive a webhook for the receiver the route was built with.
pub async fn receive(
    State(receiver): State<Arc<dyn WebhookReceiver>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    receiver.verify(&headers, &body).map_err(|e| {
        tracing::warn!(webhook = receiver.name(), error = %e, "Webhook rejected");
        e
    })?;

    receiver.dispatch(&body).await?;

    Ok(Json(WebhookResponse { received: true }))
}
