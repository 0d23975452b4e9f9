//! Stripe webhooks (`/webhooks/billing`).

use async_trait::async_trait;
use axum::http::HeaderMap;

use super::{WebhookError, WebhookReceiver};
use crate::stripe::{verify_webhook_signature, WebhookEvent};

/// Header carrying the Stripe signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// Receiver for Stripe events.
pub struct StripeWebhookReceiver {
    secret: Option<String>,
}

impl StripeWebhookReceiver {
    /// Create a receiver. Without a secret, signatures are not checked.
    #[must_use]
    pub fn new(secret: Option<String>) -> Self {
        if secret.is_none() {
            tracing::warn!("Stripe webhook_secret not configured - skipping signature verification");
        }
        Self { secret }
    }
}

fn str_field<'a>(object: &'a serde_json::Value, field: &str) -> &'a str {
    object.get(field).and_then(|v| v.as_str()).unwrap_or("unknown")
}

#[async_trait]
impl WebhookReceiver for StripeWebhookReceiver {
    fn name(&self) -> &'static str {
        "stripe"
    }

    fn verify(&self, headers: &HeaderMap, raw: &[u8]) -> Result<(), WebhookError> {
        let Some(secret) = &self.secret else {
            return Ok(());
        };

        let signature = headers
            .get(STRIPE_SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| WebhookError::InvalidSignature("missing Stripe signature".into()))?;

        verify_webhook_signature(secret, raw, signature, chrono::Utc::now().timestamp())
            .map_err(|e| WebhookError::InvalidSignature(e.to_string()))
    }

    async fn dispatch(&self, raw: &[u8]) -> Result<(), WebhookError> {
        let event: WebhookEvent =
            serde_json::from_slice(raw).map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;
        let object = &event.data.object;

        match event.event_type.as_str() {
            "customer.subscription.created" | "customer.subscription.updated" => {
                let plan = object
                    .pointer("/items/data/0/plan/id")
                    .or_else(|| object.pointer("/plan/id"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("none");
                tracing::info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    customer_id = str_field(object, "customer"),
                    subscription_id = str_field(object, "id"),
                    status = str_field(object, "status"),
                    plan,
                    "Subscription changed"
                );
            }
            "customer.subscription.deleted" => {
                tracing::info!(
                    event_id = %event.id,
                    customer_id = str_field(object, "customer"),
                    subscription_id = str_field(object, "id"),
                    "Subscription ended"
                );
            }
            "invoice.payment_failed" => {
                tracing::warn!(
                    event_id = %event.id,
                    customer_id = str_field(object, "customer"),
                    invoice_id = str_field(object, "id"),
                    attempt_count = object.get("attempt_count").and_then(serde_json::Value::as_u64),
                    "Invoice payment failed"
                );
            }
            "invoice.payment_succeeded" => {
                tracing::info!(
                    event_id = %event.id,
                    customer_id = str_field(object, "customer"),
                    invoice_id = str_field(object, "id"),
                    amount_paid = object.get("amount_paid").and_then(serde_json::Value::as_i64),
                    "Invoice paid"
                );
            }
            _ => {
                tracing::debug!(event_type = %event.event_type, "Unhandled Stripe event");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hmac_sha256_hex;

    fn signed_headers(secret: &str, payload: &str) -> HeaderMap {
        let ts = chrono::Utc::now().timestamp();
        let sig = hmac_sha256_hex(secret.as_bytes(), format!("{ts}.{payload}").as_bytes()).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(STRIPE_SIGNATURE_HEADER, format!("t={ts},v1={sig}").parse().unwrap());
        headers
    }

    #[test]
    fn verifies_signed_payload() {
        let receiver = StripeWebhookReceiver::new(Some("whsec_test".into()));
        let payload = r#"{"id":"evt_1"}"#;
        receiver
            .verify(&signed_headers("whsec_test", payload), payload.as_bytes())
            .unwrap();
    }

    #[test]
    fn rejects_missing_signature() {
        let receiver = StripeWebhookReceiver::new(Some("whsec_test".into()));
        assert!(matches!(
            receiver.verify(&HeaderMap::new(), b"{}"),
            Err(WebhookError::InvalidSignature(_))
        ));
    }

    #[test]
    fn skips_verification_without_secret() {
        let receiver = StripeWebhookReceiver::new(None);
        receiver.verify(&HeaderMap::new(), b"{}").unwrap();
    }

    #[tokio::test]
    async fn dispatches_known_and_unknown_events() {
        let receiver = StripeWebhookReceiver::new(None);
        for event_type in [
            "customer.subscription.updated",
            "customer.subscription.deleted",
            "invoice.payment_failed",
            "invoice.payment_succeeded",
            "charge.refunded",
        ] {
            let payload = serde_json::json!({
                "id": "evt_1",
                "type": event_type,
                "created": 1_700_000_000,
                "data": {"object": {"id": "obj_1", "customer": "cus_1"}}
            });
            receiver
                .dispatch(payload.to_string().as_bytes())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn rejects_malformed_payload() {
        let receiver = StripeWebhookReceiver::new(None);
        assert!(matches!(
            receiver.dispatch(b"not json").await,
            Err(WebhookError::InvalidPayload(_))
        ));
    }
}
