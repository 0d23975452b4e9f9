//! Per-route request body handling.
//!
//! Each route states how it consumes its body when it is registered:
//!
//! - [`BodyMode::Raw`]: the handler gets the exact bytes (webhooks, whose
//!   signatures cover the unmodified payload)
//! - [`BodyMode::Json`]: a non-empty body must be declared `application/json`
//!   and is parsed by the handler's `Json` extractor

use axum::extract::{Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::MethodRouter;

use crate::error::ApiError;

/// How a route consumes its request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// Pass the body through untouched.
    Raw,
    /// Require a JSON content type on any non-empty body.
    Json,
}

impl BodyMode {
    /// Attach this body mode to a route.
    pub fn apply<S>(self, route: MethodRouter<S>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        route.route_layer(middleware::from_fn_with_state(self, enforce_body_mode))
    }
}

async fn enforce_body_mode(State(mode): State<BodyMode>, request: Request, next: Next) -> Response {
    if mode == BodyMode::Json && has_body(request.headers()) && !is_json(request.headers()) {
        return ApiError::UnsupportedMediaType("Expected an application/json body".into())
            .into_response();
    }
    next.run(request).await
}

fn has_body(headers: &HeaderMap) -> bool {
    if headers.contains_key(TRANSFER_ENCODING) {
        return true;
    }
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .is_some_and(|len| len > 0)
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}
