//! Routerlimits webhooks (`/webhooks/routerlimits`).

use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Deserialize;

use super::{WebhookError, WebhookReceiver};
use crate::crypto::verify_hex_signature;

/// Header carrying the hex HMAC-SHA256 of the body.
pub const ROUTERLIMITS_SIGNATURE_HEADER: &str = "x-routerlimits-signature";

/// Routerlimits webhook payload.
#[derive(Debug, Deserialize)]
pub struct RouterLimitsEvent {
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event data.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Receiver for routerlimits events.
pub struct RouterLimitsWebhookReceiver {
    secret: Option<String>,
}

impl RouterLimitsWebhookReceiver {
    /// Create a receiver. Without a secret, signatures are not checked.
    #[must_use]
    pub fn new(secret: Option<String>) -> Self {
        if secret.is_none() {
            tracing::warn!(
                "Routerlimits webhook secret not configured - skipping signature verification"
            );
        }
        Self { secret }
    }
}

#[async_trait]
impl WebhookReceiver for RouterLimitsWebhookReceiver {
    fn name(&self) -> &'static str {
        "routerlimits"
    }

    fn verify(&self, headers: &HeaderMap, raw: &[u8]) -> Result<(), WebhookError> {
        let Some(secret) = &self.secret else {
            return Ok(());
        };

        let signature = headers
            .get(ROUTERLIMITS_SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| WebhookError::InvalidSignature("missing routerlimits signature".into()))?;

        if verify_hex_signature(secret.as_bytes(), raw, signature.trim()) {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature("signature mismatch".into()))
        }
    }

    async fn dispatch(&self, raw: &[u8]) -> Result<(), WebhookError> {
        let event: RouterLimitsEvent =
            serde_json::from_slice(raw).map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

        tracing::info!(
            event_type = %event.event_type,
            data = %event.data,
            "Received routerlimits webhook"
        );
        Ok(())
    }
}
