//! HTTP middleware for correlation and upstream quota protection.
//!
//! - **Request ID**: Generation and propagation of `X-Request-Id`
//! - **Rate Limiting**: Optional global limiter guarding the upstream token
//!
//! # Architecture
//!
//! ```text
//! Request → Request ID → Trace → CORS → [Rate Limit] → Handler → Response
//!               ↓                            ↓
//!        X-Request-Id header          429 Too Many Requests
//! ```
//!
//! The rate limiter is a route layer on `/viewstats-proxy` only, so `/health`
//! keeps answering under load.

pub mod rate_limit;
pub mod request_id;

pub use rate_limit::{RateLimitError, RateLimitLayer};
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer};
