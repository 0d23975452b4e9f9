//! No-cache header and access log.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::http::header::CACHE_CONTROL;
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::Response;

/// Headers consulted for the caller IP, most specific first.
const CLIENT_IP_HEADERS: &[&str] = &["x-client-ip", "x-forwarded-for", "cf-connecting-ip", "x-real-ip"];

/// Mark every non-`OPTIONS` response `no-store` and log the request.
///
/// Preflights are skipped so CORS negotiation does not double the log volume.
pub async fn no_cache_and_log(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    let client_ip = client_ip(request.headers()).or(peer);

    tracing::debug!(
        method = %request.method(),
        path = %request.uri().path(),
        client_ip = client_ip.as_deref().unwrap_or("unknown"),
        "Request received"
    );

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// Resolve the caller IP from proxy headers.
///
/// `x-forwarded-for` may list a chain; its first entry is the client.
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    CLIENT_IP_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn client_ip_prefers_explicit_header() {
        let map = headers(&[("x-client-ip", "10.0.0.1"), ("x-real-ip", "10.0.0.9")]);
        assert_eq!(client_ip(&map).as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn client_ip_takes_first_forwarded_entry() {
        let map = headers(&[("x-forwarded-for", "203.0.113.7, 10.0.0.2, 10.0.0.3")]);
        assert_eq!(client_ip(&map).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn client_ip_is_none_without_headers() {
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }).options(|| async { "preflight" }))
            .layer(axum::middleware::from_fn(no_cache_and_log))
    }

    #[tokio::test]
    async fn responses_are_not_cacheable() {
        let response = app()
            .oneshot(axum::http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers().get(CACHE_CONTROL).unwrap(), "no-store");
    }

    #[tokio::test]
    async fn preflights_are_left_alone() {
        let response = app()
            .oneshot(
                axum::http::Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.headers().get(CACHE_CONTROL).is_none());
    }
}
