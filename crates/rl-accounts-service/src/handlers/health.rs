//! Health check handler.

/// Body returned by `GET /healthCheck`.
pub const HEALTH_RESPONSE: &str = "Looks good, boss";

/// Health check endpoint.
pub async fn health() -> &'static str {
    HEALTH_RESPONSE
}
