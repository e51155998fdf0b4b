//! Shared application state for Axum handlers.
//!
//! Everything in here is read-only after startup: the configuration and the
//! upstream client (whose connection pool is internally synchronized). No
//! locking is needed between concurrent requests.

use std::sync::Arc;

use crate::config::Config;
use crate::error::AppResult;
use crate::upstream::ViewStatsClient;

/// Shared application state for Axum handlers.
///
/// Cloned per request; both fields are reference counted.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Client for the ViewStats API, carrying the bearer token
    pub upstream: ViewStatsClient,
}

impl AppState {
    /// Create application state, building the upstream client from `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the upstream client cannot be built.
    pub fn new(config: Config) -> AppResult<Self> {
        let upstream = ViewStatsClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            upstream,
        })
    }
}
