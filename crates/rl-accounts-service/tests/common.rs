//! Common test utilities for rl-accounts integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};

use rl_accounts_core::Plan;
use rl_accounts_service::{
    create_router, AllowedOrigins, AppState, InMemoryProvider, ServiceConfig,
};
use rl_accounts_store::MemoryStore;

/// Origin allow-listed for browser calls.
pub const ALLOWED_ORIGIN: &str = "https://app.routerlimits.test";

/// Secret for tokens accepted by `/api/authenticate`.
pub const JWT_SECRET: &str = "test-jwt-secret";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Account storage and plan catalog.
    pub store: Arc<MemoryStore>,
    /// The billing provider behind the service.
    pub provider: Arc<InMemoryProvider>,
}

/// An account registered through the API.
pub struct TestAccount {
    /// Account id.
    pub id: String,
    /// API key issued on registration.
    pub api_key: String,
}

impl TestAccount {
    /// Path of this account's resource.
    pub fn path(&self) -> String {
        format!("/api/accounts/{}", self.id)
    }
}

/// Plans in the test catalog: `basic`, `pro`, `team`.
pub fn test_plans() -> Vec<Plan> {
    [("basic", 500), ("pro", 2000), ("team", 5000)]
        .into_iter()
        .map(|(id, price_cents)| Plan {
            id: id.into(),
            billing_id: format!("plan_{id}"),
            name: id.to_uppercase(),
            description: None,
            price_cents,
            interval: "month".into(),
        })
        .collect()
}

/// Header name for the API key.
pub fn api_key_header() -> HeaderName {
    HeaderName::from_static("x-api-key")
}

/// Header value from a string.
pub fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).expect("valid header value")
}

impl TestHarness {
    /// Create a new test harness with default test configuration.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a test harness, adjusting the configuration first.
    pub fn with_config(adjust: impl FnOnce(&mut ServiceConfig)) -> Self {
        let store = Arc::new(MemoryStore::with_plans(&test_plans()).expect("seed plans"));
        let provider = Arc::new(InMemoryProvider::new());

        let mut config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            cors_origins: AllowedOrigins::parse(ALLOWED_ORIGIN),
            jwt_secret: Some(JWT_SECRET.into()),
            ..ServiceConfig::default()
        };
        adjust(&mut config);

        let state = AppState::with_provider(
            store.clone(),
            store.clone(),
            provider.clone(),
            config,
        );
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            provider,
        }
    }

    /// Register an account through the API.
    pub async fn create_account(&self) -> TestAccount {
        let response = self
            .server
            .post("/api/accounts")
            .json(&json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@example.com"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let body: Value = response.json();
        TestAccount {
            id: body["account"]["id"].as_str().expect("account id").to_string(),
            api_key: body["apiKey"].as_str().expect("api key").to_string(),
        }
    }

    /// Register an account and attach a card to it.
    pub async fn create_account_with_card(&self) -> TestAccount {
        let account = self.create_account().await;
        self.server
            .post(&format!("{}/paymentMethods", account.path()))
            .add_header(api_key_header(), header_value(&account.api_key))
            .json(&json!({"token": "tok_visa"}))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
        account
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
