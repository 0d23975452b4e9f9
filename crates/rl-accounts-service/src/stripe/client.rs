//! Stripe API client implementation.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};

use super::types::{
    Customer, Deleted, Source, StripeErrorResponse, StripeList, Subscription,
};
use crate::crypto::{constant_time_eq, hmac_sha256_hex};

/// Page size for list calls.
const LIST_PAGE_SIZE: usize = 100;

/// How far a webhook timestamp may drift from the local clock.
pub const WEBHOOK_TOLERANCE_SECONDS: i64 = 300;

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error ({status}): {error_type} - {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },

    /// Invalid webhook signature.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Webhook timestamp outside the tolerance window.
    #[error("Webhook timestamp outside tolerance")]
    StaleTimestamp,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    api_key: String,
    base_url: String,
    api_version: Option<String>,
}

impl StripeClient {
    /// Default Stripe API base URL.
    pub const BASE_URL: &'static str = "https://api.stripe.com/v1";

    /// Create a new Stripe client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Stripe secret API key (`sk_test_...` or `sk_live_...`)
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, StripeError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(StripeError::Configuration("Stripe API key is empty".into()));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: Self::BASE_URL.to_string(),
            api_version: None,
        })
    }

    /// Point the client at a different API root (used by tests and proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Pin the API version sent as `Stripe-Version`.
    #[must_use]
    pub fn with_api_version(mut self, api_version: Option<String>) -> Self {
        self.api_version = api_version;
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None);

        match &self.api_version {
            Some(version) => builder.header("Stripe-Version", version),
            None => builder,
        }
    }

    /// Create a customer.
    pub async fn create_customer(&self, name: &str, email: &str) -> Result<Customer, StripeError> {
        let response = self
            .request(Method::POST, "/customers")
            .form(&[("name", name), ("email", email)])
            .send()
            .await?;

        handle_response(response).await
    }

    /// Retrieve a customer with its sources expanded.
    pub async fn get_customer(&self, customer_id: &str) -> Result<Customer, StripeError> {
        let response = self
            .request(Method::GET, &format!("/customers/{customer_id}"))
            .query(&[("expand[]", "sources")])
            .send()
            .await?;

        handle_response(response).await
    }

    /// Delete a customer.
    pub async fn delete_customer(&self, customer_id: &str) -> Result<Deleted, StripeError> {
        let response = self
            .request(Method::DELETE, &format!("/customers/{customer_id}"))
            .send()
            .await?;

        handle_response(response).await
    }

    /// Set the customer's default source.
    pub async fn set_default_source(
        &self,
        customer_id: &str,
        source_id: &str,
    ) -> Result<Customer, StripeError> {
        let response = self
            .request(Method::POST, &format!("/customers/{customer_id}"))
            .form(&[("default_source", source_id)])
            .send()
            .await?;

        handle_response(response).await
    }

    /// Attach a tokenized source to a customer.
    pub async fn create_source(
        &self,
        customer_id: &str,
        token: &str,
    ) -> Result<Source, StripeError> {
        let response = self
            .request(Method::POST, &format!("/customers/{customer_id}/sources"))
            .form(&[("source", token)])
            .send()
            .await?;

        handle_response(response).await
    }

    /// Detach a source from a customer.
    pub async fn delete_source(
        &self,
        customer_id: &str,
        source_id: &str,
    ) -> Result<Deleted, StripeError> {
        let response = self
            .request(
                Method::DELETE,
                &format!("/customers/{customer_id}/sources/{source_id}"),
            )
            .send()
            .await?;

        handle_response(response).await
    }

    /// List a customer's subscriptions, following pagination until
    /// `max_records` have been fetched or the list ends.
    pub async fn list_subscriptions(
        &self,
        customer_id: &str,
        max_records: usize,
    ) -> Result<Vec<Subscription>, StripeError> {
        let mut subscriptions = Vec::new();
        let mut starting_after: Option<String> = None;

        while subscriptions.len() < max_records {
            let limit = LIST_PAGE_SIZE.min(max_records - subscriptions.len());
            let mut query = vec![
                ("customer", customer_id.to_string()),
                ("limit", limit.to_string()),
            ];
            if let Some(cursor) = &starting_after {
                query.push(("starting_after", cursor.clone()));
            }

            let response = self
                .request(Method::GET, "/subscriptions")
                .query(&query)
                .send()
                .await?;
            let page: StripeList<Subscription> = handle_response(response).await?;

            starting_after = page.data.last().map(|sub| sub.id.clone());
            subscriptions.extend(page.data);

            if !page.has_more || starting_after.is_none() {
                break;
            }
        }

        tracing::debug!(
            customer_id,
            count = subscriptions.len(),
            "Listed Stripe subscriptions"
        );
        Ok(subscriptions)
    }

    /// Create a single-item subscription.
    pub async fn create_subscription(
        &self,
        customer_id: &str,
        plan_id: &str,
    ) -> Result<Subscription, StripeError> {
        let response = self
            .request(Method::POST, "/subscriptions")
            .form(&[("customer", customer_id), ("items[0][plan]", plan_id)])
            .send()
            .await?;

        handle_response(response).await
    }

    /// Replace the plan on a subscription's item.
    ///
    /// Without an item id the legacy top-level `plan` parameter is used.
    pub async fn update_subscription(
        &self,
        subscription_id: &str,
        item_id: Option<&str>,
        plan_id: &str,
    ) -> Result<Subscription, StripeError> {
        let form: Vec<(&str, &str)> = match item_id {
            Some(item_id) => vec![("items[0][id]", item_id), ("items[0][plan]", plan_id)],
            None => vec![("plan", plan_id)],
        };

        let response = self
            .request(Method::POST, &format!("/subscriptions/{subscription_id}"))
            .form(&form)
            .send()
            .await?;

        handle_response(response).await
    }

    /// Cancel a subscription immediately.
    pub async fn delete_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Subscription, StripeError> {
        let response = self
            .request(Method::DELETE, &format!("/subscriptions/{subscription_id}"))
            .send()
            .await?;

        handle_response(response).await
    }
}

/// Handle API response and convert errors.
async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, StripeError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.json().await?);
    }

    // Try to parse error response
    let error_body: Result<StripeErrorResponse, _> = response.json().await;

    match error_body {
        Ok(stripe_error) => Err(StripeError::Api {
            status: status.as_u16(),
            error_type: stripe_error.error.error_type,
            message: stripe_error.error.message,
            code: stripe_error.error.code,
        }),
        Err(_) => Err(StripeError::Api {
            status: status.as_u16(),
            error_type: "unknown".to_string(),
            message: format!("HTTP {status}"),
            code: None,
        }),
    }
}

/// Verify a `Stripe-Signature` header against the raw payload.
///
/// The header has the form `t=timestamp,v1=signature[,v1=signature...]`; any
/// matching `v1` entry is accepted as long as `t` is within
/// [`WEBHOOK_TOLERANCE_SECONDS`] of `now`.
///
/// # Errors
///
/// Returns `InvalidSignature` for a malformed header or no matching
/// signature, and `StaleTimestamp` when `t` is out of range.
pub fn verify_webhook_signature(
    secret: &str,
    payload: &[u8],
    header: &str,
    now: i64,
) -> Result<(), StripeError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", ts)) => timestamp = Some(ts),
            Some(("v1", sig)) => signatures.push(sig),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(StripeError::InvalidSignature)?;
    let issued_at: i64 = timestamp
        .parse()
        .map_err(|_| StripeError::InvalidSignature)?;

    if signatures.is_empty() {
        return Err(StripeError::InvalidSignature);
    }

    let mut signed_payload = Vec::with_capacity(timestamp.len() + 1 + payload.len());
    signed_payload.extend_from_slice(timestamp.as_bytes());
    signed_payload.push(b'.');
    signed_payload.extend_from_slice(payload);

    let expected = hmac_sha256_hex(secret.as_bytes(), &signed_payload)
        .ok_or(StripeError::InvalidSignature)?;

    if !signatures.iter().any(|sig| constant_time_eq(&expected, sig)) {
        return Err(StripeError::InvalidSignature);
    }

    if (now - issued_at).abs() > WEBHOOK_TOLERANCE_SECONDS {
        return Err(StripeError::StaleTimestamp);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, timestamp: i64, payload: &str) -> String {
        let sig = hmac_sha256_hex(secret.as_bytes(), format!("{timestamp}.{payload}").as_bytes())
            .unwrap();
        format!("t={timestamp},v1={sig}")
    }

    #[test]
    fn client_creation() {
        let client = StripeClient::new("sk_test_xxx").unwrap();
        assert_eq!(client.base_url, StripeClient::BASE_URL);
        assert!(client.api_version.is_none());
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(
            StripeClient::new("  "),
            Err(StripeError::Configuration(_))
        ));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = StripeClient::new("sk_test_xxx")
            .unwrap()
            .with_base_url("http://localhost:12111/v1/");
        assert_eq!(client.base_url, "http://localhost:12111/v1");
    }

    #[test]
    fn valid_signature_is_accepted() {
        let header = sign("whsec_test", 1_700_000_000, r#"{"id":"evt_1"}"#);
        verify_webhook_signature("whsec_test", br#"{"id":"evt_1"}"#, &header, 1_700_000_100)
            .unwrap();
    }

    #[test]
    fn any_matching_v1_is_accepted() {
        let good = sign("whsec_test", 1_700_000_000, "{}");
        let header = good.replacen("v1=", "v1=deadbeef,v1=", 1);
        verify_webhook_signature("whsec_test", b"{}", &header, 1_700_000_000).unwrap();
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let header = sign("whsec_other", 1_700_000_000, "{}");
        assert!(matches!(
            verify_webhook_signature("whsec_test", b"{}", &header, 1_700_000_000),
            Err(StripeError::InvalidSignature)
        ));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let header = sign("whsec_test", 1_700_000_000, r#"{"amount":1}"#);
        assert!(verify_webhook_signature(
            "whsec_test",
            br#"{"amount":100}"#,
            &header,
            1_700_000_000
        )
        .is_err());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let header = sign("whsec_test", 1_700_000_000, "{}");
        assert!(matches!(
            verify_webhook_signature("whsec_test", b"{}", &header, 1_700_000_301),
            Err(StripeError::StaleTimestamp)
        ));
    }

    #[test]
    fn malformed_header_is_rejected() {
        for header in ["", "v1=abc", "t=notanumber,v1=abc", "t=1700000000"] {
            assert!(
                verify_webhook_signature("whsec_test", b"{}", header, 1_700_000_000).is_err(),
                "{header}"
            );
        }
    }
}
