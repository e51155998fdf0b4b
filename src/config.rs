//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded once at startup from environment variables
//! (optionally seeded from a `.env` file). The resulting [`Config`] is
//! immutable and shared with handlers through [`crate::AppState`].
//!
//! # Required
//!
//! - `VIEWSTATS_BEARER_TOKEN_SECRET`: Bearer token injected into upstream calls.
//!   The process refuses to start when it is missing or empty.
//!
//! # Upstream Tuning
//!
//! - `VIEWSTATS_API_BASE_URL`: Upstream origin (default: `https://api.viewstats.com`)
//! - `UPSTREAM_TIMEOUT_SECS`: Total upstream request timeout (default: 15)
//! - `UPSTREAM_CONNECT_TIMEOUT_SECS`: Upstream connect timeout (default: 5)
//! - `UPSTREAM_MAX_BODY_BYTES`: Largest upstream body accepted (default: 16 MiB)
//!
//! # Protection
//!
//! - `RATE_LIMIT_RPS`: Global proxy requests per second (default: 0 = disabled)
//! - `RATE_LIMIT_BURST`: Burst capacity for the limiter (default: 10)
//! - `CORS_ALLOWED_ORIGINS`: Comma-separated list of allowed origins (default: `*`)

use std::env;
use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{AppError, AppResult};

/// Environment variable holding the upstream bearer token.
pub const SECRET_ENV_VAR: &str = "VIEWSTATS_BEARER_TOKEN_SECRET";

/// Port used when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 3001;

/// Default upstream origin.
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.viewstats.com";

/// Default cap on an upstream response body.
pub const DEFAULT_UPSTREAM_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Application configuration loaded from environment variables.
///
/// The bearer token is held as a [`SecretString`] and never appears in
/// `Debug` output.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Proxy will listen on {}", config.server_addr());
/// ```
#[derive(Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3001)
    pub port: u16,

    // =========================================================================
    // Upstream Configuration
    // =========================================================================
    /// Bearer token sent to the upstream API. Never logged, never returned.
    pub bearer_token: SecretString,

    /// Upstream origin without a trailing slash
    pub upstream_base_url: String,

    /// Total timeout for a single upstream call (default: 15 seconds)
    pub upstream_timeout: Duration,

    /// Connect timeout for the upstream call (default: 5 seconds)
    pub upstream_connect_timeout: Duration,

    /// Largest upstream body relayed to a caller (default: 16 MiB)
    pub upstream_max_body_bytes: usize,

    // =========================================================================
    // Rate Limiting Configuration
    // =========================================================================
    /// Global proxy requests per second (default: 0 = disabled)
    pub rate_limit_rps: u32,

    /// Burst capacity above the sustained rate (default: 10)
    pub rate_limit_burst: u32,

    // =========================================================================
    // HTTP Surface Configuration
    // =========================================================================
    /// Allowed CORS origins. `*` allows any origin.
    pub cors_allowed_origins: Vec<String>,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Port for Prometheus metrics endpoint (default: 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the bearer token is missing or any
    /// value is malformed.
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// `from_env` delegates here; tests pass a closure over a map so that
    /// fake secrets never touch the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bearer_token = lookup(SECRET_ENV_VAR)
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                AppError::ConfigError(format!("{SECRET_ENV_VAR} environment variable is not set"))
            })?;

        let config = Self {
            // Server
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&lookup, "PORT", DEFAULT_PORT)?,

            // Upstream
            bearer_token: SecretString::new(bearer_token.into()),
            upstream_base_url: lookup("VIEWSTATS_API_BASE_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_UPSTREAM_BASE_URL.to_string())
                .trim()
                .trim_end_matches('/')
                .to_string(),
            upstream_timeout: Duration::from_secs(parse_var(&lookup, "UPSTREAM_TIMEOUT_SECS", 15)?),
            upstream_connect_timeout: Duration::from_secs(parse_var(
                &lookup,
                "UPSTREAM_CONNECT_TIMEOUT_SECS",
                5,
            )?),
            upstream_max_body_bytes: parse_var(
                &lookup,
                "UPSTREAM_MAX_BODY_BYTES",
                DEFAULT_UPSTREAM_MAX_BODY_BYTES,
            )?,

            // Rate limiting
            rate_limit_rps: parse_var(&lookup, "RATE_LIMIT_RPS", 0)?,
            rate_limit_burst: parse_var(&lookup, "RATE_LIMIT_BURST", 10)?,

            // HTTP surface
            cors_allowed_origins: parse_list(lookup("CORS_ALLOWED_ORIGINS"), "*"),

            // Observability
            metrics_port: parse_var(&lookup, "METRICS_PORT", 0)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    fn validate(&self) -> AppResult<()> {
        if self.bearer_token.expose_secret().trim().is_empty() {
            return Err(AppError::ConfigError(format!(
                "{SECRET_ENV_VAR} must not be empty"
            )));
        }

        if self.upstream_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "UPSTREAM_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if self.upstream_connect_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "UPSTREAM_CONNECT_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if self.upstream_max_body_bytes == 0 {
            return Err(AppError::ConfigError(
                "UPSTREAM_MAX_BODY_BYTES must be greater than 0".to_string(),
            ));
        }

        if self.upstream_connect_timeout > self.upstream_timeout {
            return Err(AppError::ConfigError(format!(
                "UPSTREAM_CONNECT_TIMEOUT_SECS ({:?}) must be <= UPSTREAM_TIMEOUT_SECS ({:?})",
                self.upstream_connect_timeout, self.upstream_timeout
            )));
        }

        let parsed = url::Url::parse(&self.upstream_base_url).map_err(|e| {
            AppError::ConfigError(format!("Invalid VIEWSTATS_API_BASE_URL: {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::ConfigError(format!(
                "VIEWSTATS_API_BASE_URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if rate limiting is enabled.
    pub fn rate_limiting_enabled(&self) -> bool {
        self.rate_limit_rps > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        (self.metrics_port > 0)
            .then(|| std::net::SocketAddr::from(([0, 0, 0, 0], self.metrics_port)))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("bearer_token", &"[REDACTED]")
            .field("upstream_base_url", &self.upstream_base_url)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("upstream_connect_timeout", &self.upstream_connect_timeout)
            .field("upstream_max_body_bytes", &self.upstream_max_body_bytes)
            .field("rate_limit_rps", &self.rate_limit_rps)
            .field("rate_limit_burst", &self.rate_limit_burst)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("metrics_port", &self.metrics_port)
            .finish()
    }
}

/// Parse a variable into the specified type with a default value.
fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match lookup(name) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
        None => Ok(default),
    }
}

/// Split a comma-separated list, dropping blank entries.
fn parse_list(raw: Option<String>, default: &str) -> Vec<String> {
    raw.unwrap_or_else(|| default.to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_with_only_secret() {
        let config = Config::from_lookup(lookup_from(&[(SECRET_ENV_VAR, "s3cret")])).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.bearer_token.expose_secret(), "s3cret");
        assert_eq!(config.upstream_base_url, DEFAULT_UPSTREAM_BASE_URL);
        assert_eq!(config.upstream_timeout, Duration::from_secs(15));
        assert_eq!(config.upstream_connect_timeout, Duration::from_secs(5));
        assert_eq!(config.upstream_max_body_bytes, DEFAULT_UPSTREAM_MAX_BODY_BYTES);
        assert!(!config.rate_limiting_enabled());
        assert_eq!(config.cors_allowed_origins, vec!["*".to_string()]);
        assert!(config.metrics_addr().is_none());
    }

    #[test]
    fn test_missing_secret_is_config_error() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "8080")])).unwrap_err();

        assert!(matches!(err, AppError::ConfigError(_)));
        assert!(err.to_string().contains(SECRET_ENV_VAR));
    }

    #[test]
    fn test_blank_secret_is_config_error() {
        let err = Config::from_lookup(lookup_from(&[(SECRET_ENV_VAR, "   ")])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn test_port_override() {
        let config =
            Config::from_lookup(lookup_from(&[(SECRET_ENV_VAR, "t"), ("PORT", "8088")])).unwrap();
        assert_eq!(config.port, 8088);
        assert_eq!(config.server_addr(), "0.0.0.0:8088");
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup_from(&[(SECRET_ENV_VAR, "t"), ("PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = Config::from_lookup(lookup_from(&[
            (SECRET_ENV_VAR, "t"),
            ("VIEWSTATS_API_BASE_URL", "http://127.0.0.1:9999/"),
        ]))
        .unwrap();
        assert_eq!(config.upstream_base_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn test_base_url_must_be_http() {
        let err = Config::from_lookup(lookup_from(&[
            (SECRET_ENV_VAR, "t"),
            ("VIEWSTATS_API_BASE_URL", "ftp://example.com"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("VIEWSTATS_API_BASE_URL"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            (SECRET_ENV_VAR, "t"),
            ("UPSTREAM_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("UPSTREAM_TIMEOUT_SECS"));
    }

    #[test]
    fn test_zero_max_body_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            (SECRET_ENV_VAR, "t"),
            ("UPSTREAM_MAX_BODY_BYTES", "0"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("UPSTREAM_MAX_BODY_BYTES"));
    }

    #[test]
    fn test_connect_timeout_ordering() {
        let err = Config::from_lookup(lookup_from(&[
            (SECRET_ENV_VAR, "t"),
            ("UPSTREAM_TIMEOUT_SECS", "3"),
            ("UPSTREAM_CONNECT_TIMEOUT_SECS", "10"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("UPSTREAM_CONNECT_TIMEOUT_SECS"));
    }

    #[test]
    fn test_cors_origins_list() {
        let config = Config::from_lookup(lookup_from(&[
            (SECRET_ENV_VAR, "t"),
            (
                "CORS_ALLOWED_ORIGINS",
                "https://app.example.com, ,https://admin.example.com",
            ),
        ]))
        .unwrap();
        assert_eq!(
            config.cors_allowed_origins,
            vec![
                "https://app.example.com".to_string(),
                "https://admin.example.com".to_string()
            ]
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config =
            Config::from_lookup(lookup_from(&[(SECRET_ENV_VAR, "very-secret-token")])).unwrap();
        let debug = format!("{config:?}");

        assert!(!debug.contains("very-secret-token"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("log_level"));
    }

    #[test]
    fn test_metrics_addr_enabled() {
        let config =
            Config::from_lookup(lookup_from(&[(SECRET_ENV_VAR, "t"), ("METRICS_PORT", "9090")]))
                .unwrap();
        assert_eq!(config.metrics_addr().unwrap().port(), 9090);
    }
}
