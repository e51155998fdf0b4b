use axum::http::StatusCode;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Body returned for every failure that is the proxy's own fault.
pub const INTERNAL_ERROR_BODY: &str = "Internal proxy error.";

/// Body returned when the global rate limit rejects a request.
pub const RATE_LIMITED_BODY: &str = "Rate limit exceeded. Please retry later.";

/// Application-wide error types with appropriate HTTP status codes.
///
/// An upstream response with a non-200 status is deliberately absent here:
/// it is relayed to the caller as a regular
/// [`UpstreamOutcome::Status`](crate::upstream::UpstreamOutcome::Status).
/// Only failures to obtain an upstream response at all end up as
/// `UpstreamUnavailable` or `UpstreamBody`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Upstream request failed: {0}")]
    UpstreamUnavailable(String),

    #[error("Failed to read upstream response body: {0}")]
    UpstreamBody(String),

    #[error("Upstream response body exceeds {limit} bytes")]
    UpstreamBodyTooLarge { limit: usize },

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// HTTP status code this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::UpstreamUnavailable(_)
            | AppError::UpstreamBody(_)
            | AppError::UpstreamBodyTooLarge { .. }
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Full detail stays server-side; callers get a fixed plain-text body
        let message = match &self {
            AppError::BadRequest(msg) => {
                tracing::warn!(error = %self, "Rejected request");
                msg.clone()
            }
            AppError::RateLimited => {
                tracing::warn!(error = %self, "Rejected request");
                RATE_LIMITED_BODY.to_string()
            }
            AppError::UpstreamUnavailable(_)
            | AppError::UpstreamBody(_)
            | AppError::UpstreamBodyTooLarge { .. }
            | AppError::ConfigError(_) => {
                tracing::error!(error = %self, "Request failed");
                INTERNAL_ERROR_BODY.to_string()
            }
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            message,
        )
            .into_response()
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_bad_request_keeps_message() {
        let response =
            AppError::BadRequest("Missing required query parameter: handle".to_string())
                .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            body_text(response).await,
            "Missing required query parameter: handle"
        );
    }

    #[tokio::test]
    async fn test_upstream_unavailable_hides_detail() {
        let response = AppError::UpstreamUnavailable(
            "error sending request for url (https://api.viewstats.com/channels/x/stats)"
                .to_string(),
        )
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(response).await;
        assert_eq!(body, INTERNAL_ERROR_BODY);
        assert!(!body.contains("viewstats.com"));
    }

    #[tokio::test]
    async fn test_rate_limited_is_429() {
        let response = AppError::RateLimited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body_text(response).await, RATE_LIMITED_BODY);
    }

    #[test]
    fn test_internal_variants_map_to_500() {
        for err in [
            AppError::UpstreamBody("eof".to_string()),
            AppError::UpstreamBodyTooLarge { limit: 16 },
            AppError::ConfigError("bad".to_string()),
        ] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
