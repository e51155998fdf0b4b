//! Liveness endpoint.
//!
//! `GET /health` answers `200 OK` with a fixed body. It does not touch the
//! upstream API, so it reports process health only.

use tracing::instrument;

/// Fixed body of the liveness response.
pub const HEALTH_BODY: &str = "OK";

/// Health check endpoint. Always returns 200.
#[instrument]
pub async fn health_check() -> &'static str {
    HEALTH_BODY
}
