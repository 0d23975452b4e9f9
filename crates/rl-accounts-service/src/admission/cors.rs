//! CORS negotiation for the `/api` routes.
//!
//! Disallowed origins get a bare `403` with no CORS headers at all, which is
//! why this is hand-rolled rather than `tower_http::cors`.

use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE, ORIGIN, VARY,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::config::AllowedOrigins;

/// Request headers a browser may send.
pub const ALLOW_HEADERS: &str = "Content-Type,Authorization,X-API-Key,Accept-Version";

/// Methods a browser may use.
pub const ALLOW_METHODS: &str = "DELETE,GET,POST";

/// Response headers a browser may read.
pub const EXPOSE_HEADERS: &str =
    "api-version, content-length, content-md5, content-type, date, request-id, response-time";

/// How long a preflight may be cached, in seconds.
pub const MAX_AGE_SECONDS: &str = "86400";

/// Answer preflights and tag cross-origin responses.
///
/// Requests without an `Origin` header pass through untouched.
pub async fn cors_wrangler(
    State(allowed): State<AllowedOrigins>,
    request: Request,
    next: Next,
) -> Response {
    let origin = check_origin(request.headers(), &allowed);

    if request.method() == Method::OPTIONS {
        let OriginCheck::Allowed(origin) = origin else {
            return StatusCode::FORBIDDEN.into_response();
        };

        let mut response = StatusCode::OK.into_response();
        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(VARY, HeaderValue::from_static("Origin"));
        headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static(EXPOSE_HEADERS));
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE_SECONDS));
        return response;
    }

    match origin {
        OriginCheck::Absent => next.run(request).await,
        OriginCheck::Denied => StatusCode::FORBIDDEN.into_response(),
        OriginCheck::Allowed(origin) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static(EXPOSE_HEADERS));
            headers.insert(VARY, HeaderValue::from_static("Origin"));
            response
        }
    }
}

enum OriginCheck {
    Absent,
    Denied,
    /// Lowercased origin to echo back.
    Allowed(HeaderValue),
}

fn check_origin(headers: &HeaderMap, allowed: &AllowedOrigins) -> OriginCheck {
    let Some(raw) = headers.get(ORIGIN) else {
        return OriginCheck::Absent;
    };

    let Ok(origin) = raw.to_str().map(str::to_ascii_lowercase) else {
        return OriginCheck::Denied;
    };
    if !allowed.permits(&origin) {
        return OriginCheck::Denied;
    }

    HeaderValue::from_str(&origin).map_or(OriginCheck::Denied, OriginCheck::Allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    fn app(allowed: AllowedOrigins) -> Router {
        Router::new()
            .route("/api/thing", post(|| async { "handled" }))
            .layer(axum::middleware::from_fn_with_state(allowed, cors_wrangler))
    }

    fn allow_list() -> AllowedOrigins {
        AllowedOrigins::parse("https://app.example.com")
    }

    async fn send(app: Router, method: Method, origin: Option<&str>) -> Response {
        let mut builder = axum::http::Request::builder().method(method).uri("/api/thing");
        if let Some(origin) = origin {
            builder = builder.header(ORIGIN, origin);
        }
        app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
    }

    fn has_cors_headers(response: &Response) -> bool {
        [
            ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_EXPOSE_HEADERS,
            ACCESS_CONTROL_MAX_AGE,
        ]
        .iter()
        .any(|h| response.headers().contains_key(h))
    }

    #[tokio::test]
    async fn preflight_from_allowed_origin() {
        let response = send(app(allow_list()), Method::OPTIONS, Some("https://App.Example.com")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example.com");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
        assert_eq!(headers[ACCESS_CONTROL_EXPOSE_HEADERS], EXPOSE_HEADERS);
        assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "86400");
        assert_eq!(headers[VARY], "Origin");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn preflight_from_unknown_origin_is_forbidden() {
        let response = send(app(allow_list()), Method::OPTIONS, Some("https://evil.example.com")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(!has_cors_headers(&response));
    }

    #[tokio::test]
    async fn preflight_without_origin_is_forbidden() {
        let response = send(app(AllowedOrigins::Any), Method::OPTIONS, None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(!has_cors_headers(&response));
    }

    #[tokio::test]
    async fn wildcard_allows_any_origin() {
        let response = send(app(AllowedOrigins::Any), Method::OPTIONS, Some("https://x.example")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "https://x.example");
    }

    #[tokio::test]
    async fn simple_request_from_allowed_origin_is_tagged() {
        let response = send(app(allow_list()), Method::POST, Some("https://app.example.com")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example.com");
        assert_eq!(response.headers()[ACCESS_CONTROL_EXPOSE_HEADERS], EXPOSE_HEADERS);
        assert!(!response.headers().contains_key(ACCESS_CONTROL_MAX_AGE));
    }

    #[tokio::test]
    async fn simple_request_from_unknown_origin_never_reaches_handler() {
        let response = send(app(allow_list()), Method::POST, Some("https://evil.example.com")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn request_without_origin_bypasses_cors() {
        let response = send(app(allow_list()), Method::POST, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!has_cors_headers(&response));
    }
}
