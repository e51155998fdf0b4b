//! The secret-injecting proxy endpoint.
//!
//! # Endpoint
//!
//! - `GET /viewstats-proxy?handle=<handle>&range=<range>`
//!
//! # Response Mapping
//!
//! | Upstream                 | Caller receives                                  |
//! |--------------------------|--------------------------------------------------|
//! | 200 + bytes              | 200, `application/octet-stream`, same bytes      |
//! | any other status + body  | same status, same body, upstream `Content-Type`  |
//! | unreachable / timed out  | 500, `Internal proxy error.`                     |
//!
//! Missing or empty `handle`/`range` short-circuits to 400 before any
//! upstream call. No upstream response header other than `Content-Type` is
//! relayed.

use axum::Extension;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{info, instrument};

use crate::error::{AppError, AppResult};
use crate::metrics::{self, outcome};
use crate::middleware::RequestId;
use crate::models::ProxyQuery;
use crate::state::AppState;
use crate::upstream::UpstreamOutcome;
use crate::validation::validate_proxy_query;

/// Content type of a successful proxy response.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Body substituted when an upstream error response has no body.
pub const EMPTY_UPSTREAM_ERROR_BODY: &str = "Error fetching from upstream API.";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Proxy a channel stats request to ViewStats with the server-held token.
#[instrument(skip_all, fields(request_id = request_id.as_ref().map(|id| id.0.as_str())))]
pub async fn viewstats_proxy(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    query: Result<Query<ProxyQuery>, QueryRejection>,
) -> AppResult<Response> {
    let request = query
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
        .and_then(|Query(query)| validate_proxy_query(&query))
        .inspect_err(|_| metrics::record_request(outcome::BAD_REQUEST))?;

    let request_id = request_id.as_ref().map(|id| id.0.as_str());
    let result = state.upstream.fetch_stats(&request, request_id).await;

    match result {
        Ok(UpstreamOutcome::Success { body }) => {
            info!(bytes = body.len(), "Relaying upstream stats");
            metrics::record_request(outcome::SUCCESS);
            Ok(octet_stream_response(body))
        }
        Ok(UpstreamOutcome::Status {
            status,
            content_type,
            body,
        }) => {
            info!(status = status.as_u16(), bytes = body.len(), "Relaying upstream status");
            metrics::record_request(outcome::UPSTREAM_STATUS);
            Ok(passthrough_response(status, content_type, body))
        }
        Err(e) => {
            metrics::record_request(outcome::UPSTREAM_ERROR);
            Err(e)
        }
    }
}

/// 200 response carrying the upstream payload untouched.
fn octet_stream_response(body: Bytes) -> Response {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM))],
        body,
    )
        .into_response()
}

/// Relay a non-200 upstream response.
///
/// An empty error body (4xx/5xx) is replaced with
/// [`EMPTY_UPSTREAM_ERROR_BODY`] so callers always get something readable.
fn passthrough_response(
    status: StatusCode,
    content_type: Option<HeaderValue>,
    body: Bytes,
) -> Response {
    if body.is_empty() && (status.is_client_error() || status.is_server_error()) {
        return (
            status,
            [(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN))],
            EMPTY_UPSTREAM_ERROR_BODY,
        )
            .into_response();
    }

    let content_type = content_type.unwrap_or_else(|| HeaderValue::from_static(TEXT_PLAIN));
    (status, [(CONTENT_TYPE, content_type)], body).into_response()
}
