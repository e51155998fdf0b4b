//! HTTP client for the ViewStats analytics API.
//!
//! # Responsibilities
//!
//! - Build the stats URL from a validated [`StatsRequest`]
//! - Attach the bearer token, a proxy user agent and `Accept-Encoding: identity`
//! - Read the response as raw bytes, never decoding or decompressing it
//! - Refuse bodies larger than `UPSTREAM_MAX_BODY_BYTES`
//! - Classify the result into [`UpstreamOutcome`] or a transport [`AppError`]
//!
//! # Timeouts
//!
//! The underlying `reqwest::Client` carries both a connect timeout and a total
//! request timeout from [`Config`]. A timed out call is a transport failure.
//! No retries are attempted.
//!
//! # Cancellation
//!
//! `fetch_stats` holds no state outside its future. When the inbound
//! connection goes away Axum drops the handler future and the in-flight
//! upstream request is dropped with it.

mod params;

pub use params::{
    FIXED_QUERY, StatsRequest, build_stats_url, encode_path_segment, range_alters_query,
};

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use reqwest::StatusCode;
use reqwest::header::{
    ACCEPT_ENCODING, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::middleware::REQUEST_ID_HEADER;
use crate::utils::{lossy_preview, redact};

/// User agent identifying this proxy to the upstream API.
pub const PROXY_USER_AGENT: &str = "TrendyBotViewStatsProxy/1.0";

/// Maximum number of bytes of an error body written to logs.
const ERROR_PREVIEW_LIMIT: usize = 512;

/// Result of an upstream call that produced an HTTP response.
///
/// Transport failures are not represented here; they surface as
/// `Err(AppError::UpstreamUnavailable)` from [`ViewStatsClient::fetch_stats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamOutcome {
    /// Upstream answered 200; `body` is the exact payload.
    Success { body: Bytes },
    /// Upstream answered with any other status.
    Status {
        status: StatusCode,
        content_type: Option<HeaderValue>,
        body: Bytes,
    },
}

/// Client for the ViewStats stats endpoint.
///
/// Cheap to clone; the connection pool and headers are shared.
#[derive(Clone)]
pub struct ViewStatsClient {
    http: reqwest::Client,
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: String,
    bearer_token: SecretString,
    default_headers: HeaderMap,
    max_body_bytes: usize,
}

impl ViewStatsClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the bearer token cannot be used as a
    /// header value or the HTTP client cannot be built.
    pub fn new(config: &Config) -> AppResult<Self> {
        let mut authorization =
            HeaderValue::from_str(&format!("Bearer {}", config.bearer_token.expose_secret()))
                .map_err(|_| {
                    AppError::ConfigError(
                        "Bearer token contains characters not allowed in an HTTP header"
                            .to_string(),
                    )
                })?;
        authorization.set_sensitive(true);

        let mut default_headers = HeaderMap::new();
        default_headers.insert(AUTHORIZATION, authorization);
        default_headers.insert(USER_AGENT, HeaderValue::from_static(PROXY_USER_AGENT));
        default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

        let http = reqwest::Client::builder()
            .connect_timeout(config.upstream_connect_timeout)
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            inner: Arc::new(ClientInner {
                base_url: config.upstream_base_url.clone(),
                bearer_token: config.bearer_token.clone(),
                default_headers,
                max_body_bytes: config.upstream_max_body_bytes,
            }),
        })
    }

    /// Fetch channel stats for `request`.
    ///
    /// `request_id` is forwarded as `X-Request-Id` so upstream logs can be
    /// correlated with ours.
    ///
    /// # Errors
    ///
    /// - `AppError::UpstreamUnavailable` on DNS, connect, TLS or timeout failures
    /// - `AppError::UpstreamBody` if the body cannot be read completely
    /// - `AppError::UpstreamBodyTooLarge` if the body exceeds the configured cap
    pub async fn fetch_stats(
        &self,
        request: &StatsRequest,
        request_id: Option<&str>,
    ) -> AppResult<UpstreamOutcome> {
        let url = build_stats_url(&self.inner.base_url, request);
        let secret = self.inner.bearer_token.expose_secret();

        info!(
            handle = %redact(&request.handle, secret),
            range = %redact(&request.range, secret),
            url = %redact(&url, secret),
            "Requesting channel stats from upstream"
        );
        if range_alters_query(&request.range) {
            warn!(
                range = %redact(&request.range, secret),
                "Range contains '&' or '#' and changes the upstream query string"
            );
        }

        let mut builder = self
            .http
            .get(&url)
            .headers(self.inner.default_headers.clone());
        if let Some(id) = request_id
            && let Ok(value) = HeaderValue::from_str(id)
        {
            builder = builder.header(REQUEST_ID_HEADER, value);
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(|e| {
            metrics::record_upstream_duration("error", started.elapsed().as_secs_f64());
            AppError::UpstreamUnavailable(redact(&describe_transport_error(e), secret).into_owned())
        })?;

        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = read_body(response, self.inner.max_body_bytes)
            .await
            .map_err(|e| match e {
                AppError::UpstreamBody(msg) => AppError::UpstreamBody(redact(&msg, secret).into_owned()),
                other => other,
            })?;

        metrics::record_upstream_duration(status.as_str(), started.elapsed().as_secs_f64());
        metrics::record_upstream_status(status.as_u16());

        if status == StatusCode::OK {
            debug!(
                handle = %redact(&request.handle, secret),
                bytes = body.len(),
                "Upstream stats fetched"
            );
            return Ok(UpstreamOutcome::Success { body });
        }

        warn!(
            handle = %redact(&request.handle, secret),
            status = status.as_u16(),
            body = %redact(&lossy_preview(&body, ERROR_PREVIEW_LIMIT), secret),
            "Upstream returned non-success status"
        );

        Ok(UpstreamOutcome::Status {
            status,
            content_type,
            body,
        })
    }
}

impl fmt::Debug for ViewStatsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewStatsClient")
            .field("base_url", &self.inner.base_url)
            .field("bearer_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Read the whole body in chunks, failing once it grows past `limit` bytes.
async fn read_body(mut response: reqwest::Response, limit: usize) -> AppResult<Bytes> {
    let too_large = || AppError::UpstreamBodyTooLarge { limit };

    if response
        .content_length()
        .is_some_and(|len| len > limit as u64)
    {
        return Err(too_large());
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| AppError::UpstreamBody(e.without_url().to_string()))?
    {
        if body.len() + chunk.len() > limit {
            return Err(too_large());
        }
        body.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(body))
}

/// Describe a transport failure without the request URL.
fn describe_transport_error(error: reqwest::Error) -> String {
    let kind = if error.is_timeout() {
        "timeout"
    } else if error.is_connect() {
        "connect"
    } else {
        "transport"
    };
    format!("{kind}: {}", error.without_url())
}
