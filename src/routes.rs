//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │   Request ID     │ ← Adds X-Request-Id header
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← HTTP request/response logging
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │      CORS        │ ← Cross-origin headers
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │  Rate Limiting   │ ← 429 if exceeded (proxy route only, optional)
//! └────────┬─────────┘
//!          ▼
//!      Handler
//! ```
//!
//! # Routes
//!
//! - `GET /viewstats-proxy` - Secret-injecting proxy to the ViewStats API
//! - `GET /health` - Liveness check

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::middleware::{RateLimitError, RateLimitLayer, RequestIdLayer};
use crate::state::AppState;

/// Path of the proxy endpoint.
pub const PROXY_PATH: &str = "/viewstats-proxy";

/// Path of the liveness endpoint.
pub const HEALTH_PATH: &str = "/health";

/// Build the application router with all routes and middleware configured.
///
/// - **Rate Limiting**: Route layer on the proxy if `rate_limit_rps > 0`
/// - **CORS**: Configured from `cors_allowed_origins`
///
/// # Errors
///
/// Returns `RateLimitError` if rate limiting configuration is invalid.
pub fn build_router(state: AppState) -> Result<Router, RateLimitError> {
    let config = &state.config;

    let mut proxy = Router::new().route(PROXY_PATH, get(handlers::viewstats_proxy));

    if config.rate_limiting_enabled() {
        info!(
            rps = config.rate_limit_rps,
            burst = config.rate_limit_burst,
            "Global proxy rate limiting enabled"
        );
        proxy = proxy.route_layer(RateLimitLayer::new(
            config.rate_limit_rps,
            config.rate_limit_burst,
        )?);
    } else {
        info!("Rate limiting disabled (RATE_LIMIT_RPS=0)");
    }

    let router = Router::new()
        .route(HEALTH_PATH, get(handlers::health_check))
        .merge(proxy)
        .layer(build_cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(RequestIdLayer::new());

    Ok(router.with_state(state))
}

/// Build CORS layer from configuration.
///
/// `*` anywhere in the list allows any origin. Only `GET` is ever needed.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<_> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    cors.allow_origin(origins)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{Config, SECRET_ENV_VAR};

    fn test_state(rate_limit_rps: &'static str) -> AppState {
        let config = Config::from_lookup(move |name| match name {
            SECRET_ENV_VAR => Some("router-secret".to_string()),
            // Nothing listens here; health must not care
            "VIEWSTATS_API_BASE_URL" => Some("http://127.0.0.1:9".to_string()),
            "RATE_LIMIT_RPS" => Some(rate_limit_rps.to_string()),
            "RATE_LIMIT_BURST" => Some("1".to_string()),
            _ => None,
        })
        .unwrap();
        AppState::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_health_route() {
        let app = build_router(test_state("0")).unwrap();

        let response = app
            .oneshot(Request::get(HEALTH_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_missing_params_short_circuit() {
        let app = build_router(test_state("0")).unwrap();

        let response = app
            .oneshot(
                Request::get("/viewstats-proxy?range=28")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("handle"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = build_router(test_state("0")).unwrap();

        let response = app
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_post_to_proxy_is_405() {
        let app = build_router(test_state("0")).unwrap();

        let response = app
            .oneshot(
                Request::post("/viewstats-proxy?handle=a&range=28")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_rate_limit_does_not_cover_health() {
        let app = build_router(test_state("1")).unwrap();

        for _ in 0..5 {
            let response = app
                .clone()
                .oneshot(Request::get(HEALTH_PATH).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_rate_limit_covers_proxy() {
        let app = build_router(test_state("1")).unwrap();

        // Burst of 1: the first request spends it (400 before any upstream call),
        // the second is rejected by the limiter.
        let first = app
            .clone()
            .oneshot(Request::get(PROXY_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let second = app
            .oneshot(Request::get(PROXY_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(first.status(), StatusCode::BAD_REQUEST);
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    async fn preflight(origins: &[String], origin: &str) -> axum::response::Response {
        let app = Router::new()
            .route(PROXY_PATH, get(|| async { "ok" }))
            .layer(build_cors_layer(origins));

        app.oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri(PROXY_PATH)
                .header("origin", origin)
                .header("access-control-request-method", "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_listed_origin() {
        let origins = vec![
            "https://example.com".to_string(),
            "https://app.example.com".to_string(),
        ];

        let response = preflight(&origins, "https://app.example.com").await;

        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://app.example.com"
        );
        let methods = response.headers()["access-control-allow-methods"]
            .to_str()
            .unwrap();
        assert!(methods.contains("GET"));
    }

    #[tokio::test]
    async fn test_cors_preflight_rejects_unlisted_origin() {
        let origins = vec!["https://example.com".to_string()];

        let response = preflight(&origins, "https://evil.example.net").await;

        assert!(!response.headers().contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn test_cors_wildcard_allows_any_origin() {
        let response = preflight(&["*".to_string()], "https://anywhere.example").await;

        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}
