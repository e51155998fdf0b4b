//! Global rate limiting for the proxy route.
//!
//! # Scope
//!
//! Every proxied request spends the same upstream bearer token. One GCRA
//! limiter (`governor` direct limiter) is shared by all callers and caps the
//! rate at which the proxy calls upstream. Only the proxy route is wrapped.
//!
//! # Configuration
//!
//! - `RATE_LIMIT_RPS`: Sustained requests per second (0 disables the layer)
//! - `RATE_LIMIT_BURST`: Burst capacity above the sustained rate
//!
//! # Response Headers
//!
//! On rate limit exceeded (429):
//! - `Retry-After`: Seconds until the next request will be accepted
//! - `X-RateLimit-Limit`: Configured RPS limit

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{HeaderValue, Request, Response};
use axum::response::IntoResponse;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tower::{Layer, Service};
use tracing::warn;

use crate::error::AppError;
use crate::metrics;

/// Error type for rate limit layer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitError {
    /// RPS value cannot be zero.
    ZeroRps,
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitError::ZeroRps => {
                write!(f, "RPS must be greater than 0; omit the layer to disable limiting")
            }
        }
    }
}

impl std::error::Error for RateLimitError {}

/// Rate limiting layer shared by every request it wraps.
///
/// # Example
///
/// ```rust,ignore
/// let layer = RateLimitLayer::new(5, 10)?; // 5 RPS, burst of 10
/// let app = Router::new()
///     .route("/viewstats-proxy", get(handler))
///     .route_layer(layer);
/// ```
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<DefaultDirectRateLimiter>,
    /// Configured RPS limit (for headers)
    limit: u32,
}

impl RateLimitLayer {
    /// Create a new global rate limit layer.
    ///
    /// A `burst` of 0 is treated as 1.
    ///
    /// # Errors
    ///
    /// Returns `RateLimitError::ZeroRps` if `rps` is 0.
    pub fn new(rps: u32, burst: u32) -> Result<Self, RateLimitError> {
        let rps_nonzero = NonZeroU32::new(rps).ok_or(RateLimitError::ZeroRps)?;
        let burst_nonzero = NonZeroU32::new(burst.max(1)).unwrap_or(NonZeroU32::MIN);

        let quota = Quota::per_second(rps_nonzero).allow_burst(burst_nonzero);

        Ok(Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            limit: rps,
        })
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: self.limiter.clone(),
            limit: self.limit,
        }
    }
}

/// Rate limiting service wrapper.
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: Arc<DefaultDirectRateLimiter>,
    limit: u32,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        match self.limiter.check() {
            Ok(()) => {
                let mut inner = self.inner.clone();
                Box::pin(async move { inner.call(req).await })
            }
            Err(not_until) => {
                let wait_time = not_until.wait_time_from(DefaultClock::default().now());
                let retry_after = wait_time.as_secs().max(1);

                warn!(
                    path = %req.uri().path(),
                    retry_after_secs = retry_after,
                    "Global rate limit exceeded"
                );
                metrics::record_request(metrics::outcome::RATE_LIMITED);

                let mut response = AppError::RateLimited.into_response();
                let headers = response.headers_mut();
                headers.insert("retry-after", HeaderValue::from(retry_after));
                headers.insert("x-ratelimit-limit", HeaderValue::from(self.limit));

                Box::pin(async move { Ok(response) })
            }
        }
    }
}
