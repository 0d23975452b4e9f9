//! Request admission integration tests: API keys, CORS and body handling.

mod common;

use axum::http::{HeaderName, Method, StatusCode};
use common::{api_key_header, header_value, TestHarness, ALLOWED_ORIGIN};
use serde_json::json;

fn origin() -> HeaderName {
    HeaderName::from_static("origin")
}

// ============================================================================
// API keys
// ============================================================================

#[tokio::test]
async fn protected_route_without_key_is_unauthorized() {
    let harness = TestHarness::new();
    let account = harness.create_account().await;

    let response = harness.server.get(&account.path()).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn unknown_key_is_unauthorized() {
    let harness = TestHarness::new();
    let account = harness.create_account().await;

    let response = harness
        .server
        .get(&account.path())
        .add_header(api_key_header(), header_value("rlk_00000000000000000000000000000000"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn key_cannot_address_another_account() {
    let harness = TestHarness::new();
    let alice = harness.create_account().await;
    let bob = harness.create_account().await;

    let response = harness
        .server
        .get(&bob.path())
        .add_header(api_key_header(), header_value(&alice.api_key))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);

    let response = harness
        .server
        .get("/api/accounts/not-a-uuid")
        .add_header(api_key_header(), header_value(&alice.api_key))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

// ============================================================================
// CORS
// ============================================================================

#[tokio::test]
async fn preflight_from_allowed_origin_gets_cors_headers() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .method(Method::OPTIONS, "/api/accounts")
        .add_header(origin(), header_value(ALLOWED_ORIGIN))
        .await;

    response.assert_status_ok();
    assert_eq!(response.headers()["access-control-allow-origin"], ALLOWED_ORIGIN);
    assert_eq!(response.headers()["access-control-allow-methods"], "DELETE,GET,POST");
    assert_eq!(response.headers()["access-control-max-age"], "86400");
    assert_eq!(response.headers()["vary"], "Origin");
}

#[tokio::test]
async fn preflight_from_unlisted_origin_is_forbidden_without_cors_headers() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .method(Method::OPTIONS, "/api/accounts")
        .add_header(origin(), header_value("https://evil.example.com"))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert!(response
        .headers()
        .keys()
        .all(|name| !name.as_str().starts_with("access-control-")));
}

#[tokio::test]
async fn preflight_without_origin_is_forbidden() {
    let harness = TestHarness::new();

    let response = harness.server.method(Method::OPTIONS, "/api/plans").await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cross_origin_request_from_unlisted_origin_is_forbidden() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/api/plans")
        .add_header(origin(), header_value("https://evil.example.com"))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cross_origin_request_from_allowed_origin_is_tagged() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/api/plans")
        .add_header(origin(), header_value(ALLOWED_ORIGIN))
        .await;

    response.assert_status_ok();
    assert_eq!(response.headers()["access-control-allow-origin"], ALLOWED_ORIGIN);
    assert!(response.headers().contains_key("access-control-expose-headers"));
}

#[tokio::test]
async fn wildcard_allows_any_origin() {
    let harness = TestHarness::with_config(|config| {
        config.cors_origins = rl_accounts_service::AllowedOrigins::Any;
    });

    let response = harness
        .server
        .method(Method::OPTIONS, "/api/plans")
        .add_header(origin(), header_value("https://anywhere.example"))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "https://anywhere.example"
    );
}

// ============================================================================
// Body handling
// ============================================================================

#[tokio::test]
async fn json_route_rejects_non_json_body() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/accounts")
        .text(r#"{"firstName":"Ada","lastName":"Lovelace","email":"ada@example.com"}"#)
        .await;

    response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn account_route_checks_key_before_body() {
    let harness = TestHarness::new();
    let account = harness.create_account().await;
    let path = format!("{}/paymentMethods", account.path());

    let response = harness.server.post(&path).text("tok_visa").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<serde_json::Value>()["error"]["code"], "unauthorized");

    harness
        .server
        .post(&path)
        .add_header(api_key_header(), header_value(&account.api_key))
        .text("tok_visa")
        .await
        .assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(harness.provider.mutation_count(), 1);
}

#[tokio::test]
async fn responses_are_marked_no_store() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/accounts")
        .json(&json!({"firstName": "Ada", "lastName": "Lovelace", "email": "ada@example.com"}))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.headers()["cache-control"], "no-store");
}
