//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, MethodRouter};
use axum::Router;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::admission::{cors_wrangler, no_cache_and_log, require_account, BodyMode};
use crate::error::ApiError;
use crate::handlers::{accounts, authenticate, health, payment_methods, plans, proxy};
use crate::state::AppState;
use crate::webhooks::{self, RouterLimitsWebhookReceiver, StripeWebhookReceiver, WebhookReceiver};

/// Maximum concurrent requests across all `/api` routes.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /healthCheck` - Health check
/// - `POST /api/authenticate` - Exchange a token for an API key
/// - `POST /api/accounts` - Register an account
/// - `GET /api/plans` - List plans
/// - `POST /api/proxy/users` - Create a user upstream
///
/// ## Accounts (API key auth, own account only)
/// - `GET /api/accounts/:accountId` - Get account and current plan
/// - `POST /api/accounts/:accountId` - Update profile and/or plan
/// - `GET /api/accounts/:accountId/paymentMethods` - List cards
/// - `POST /api/accounts/:accountId/paymentMethods` - Add a card
/// - `DELETE /api/accounts/:accountId/paymentMethods/:methodId` - Remove a card
/// - `POST /api/accounts/:accountId/paymentMethods/:methodId/setDefault` - Set default card
///
/// ## Webhooks (signature verification, raw body)
/// - `POST /webhooks/billing` - Stripe webhooks
/// - `POST /webhooks/routerlimits` - Routerlimits webhooks
pub fn create_router(state: AppState) -> Router {
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = Duration::from_secs(state.config.request_timeout_seconds);

    let stripe_webhooks: Arc<dyn WebhookReceiver> = Arc::new(StripeWebhookReceiver::new(
        state.config.stripe_webhook_secret.clone(),
    ));
    let routerlimits_webhooks: Arc<dyn WebhookReceiver> = Arc::new(
        RouterLimitsWebhookReceiver::new(state.config.routerlimits_webhook_secret.clone()),
    );

    let state = Arc::new(state);
    let json = BodyMode::Json;

    let api_routes = Router::new()
        .route(
            "/authenticate",
            json.apply(post(authenticate::authenticate)),
        )
        .route("/accounts", json.apply(post(accounts::create_account)))
        .route(
            "/accounts/:accountId",
            account_route(
                &state,
                get(accounts::get_account).post(accounts::update_account),
            ),
        )
        .route(
            "/accounts/:accountId/paymentMethods",
            account_route(
                &state,
                get(payment_methods::list_payment_methods)
                    .post(payment_methods::create_payment_method),
            ),
        )
        .route(
            "/accounts/:accountId/paymentMethods/:methodId",
            account_route(&state, delete(payment_methods::delete_payment_method)),
        )
        .route(
            "/accounts/:accountId/paymentMethods/:methodId/setDefault",
            account_route(&state, post(payment_methods::set_default_payment_method)),
        )
        .route("/plans", json.apply(get(plans::list_plans)))
        .route("/proxy/users", json.apply(post(proxy::create_user)));

    let api_routes = limit_concurrency(api_routes, API_MAX_CONCURRENT_REQUESTS)
        .layer(middleware::from_fn_with_state(cors_origins, cors_wrangler));

    let webhook_routes = Router::new()
        .route(
            "/webhooks/billing",
            BodyMode::Raw.apply(post(webhooks::receive)),
        )
        .with_state(stripe_webhooks)
        .merge(
            Router::new()
                .route(
                    "/webhooks/routerlimits",
                    BodyMode::Raw.apply(post(webhooks::receive)),
                )
                .with_state(routerlimits_webhooks),
        );

    let app = Router::new()
        .route("/healthCheck", get(health::health))
        .nest("/api", api_routes)
        .with_state(state)
        .merge(webhook_routes);

    with_global_layers(app, max_body_bytes, request_timeout)
}

/// A JSON route that requires the caller's API key.
///
/// The key is checked before the body mode.
fn account_route(
    state: &Arc<AppState>,
    route: MethodRouter<Arc<AppState>>,
) -> MethodRouter<Arc<AppState>> {
    BodyMode::Json
        .apply(route)
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(state),
            require_account,
        ))
}

/// Cap in-flight requests over every route of `router` together.
///
/// `Router::layer` wraps each route separately, so the semaphore has to be
/// shared rather than created per route.
fn limit_concurrency<S>(router: Router<S>, max: usize) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(GlobalConcurrencyLimitLayer::new(max))
}

/// Middleware applied to every route, webhooks included.
///
/// The no-store layer is outermost so timeout and panic responses carry it.
fn with_global_layers(router: Router, max_body_bytes: usize, request_timeout: Duration) -> Router {
    router
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(no_cache_and_log))
}

/// Turn a handler panic into an opaque `500`.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}
