//! # ViewStats Proxy
//!
//! A single-route HTTP proxy that forwards channel stats lookups to the
//! ViewStats analytics API, injecting a server-held bearer token the caller
//! never sees.
//!
//! - **Secret isolation**: the token lives in a `SecretString`, is attached only
//!   to upstream requests, and is redacted from every log line
//! - **Fidelity**: upstream bodies are relayed as raw bytes, statuses as-is
//! - **Bounded**: upstream calls carry connect and total timeouts
//! - **Observability**: request IDs, structured logging, optional Prometheus
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Request ID → Trace → CORS → [Rate Limit])      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (viewstats_proxy, health_check)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ViewStatsClient (reqwest, bearer token, raw bytes)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ViewStats API                                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use viewstats_proxy::{AppState, Config, build_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let addr = config.server_addr();
//!     let app = build_router(AppState::new(config)?)?;
//!
//!     let listener = tokio::net::TcpListener::bind(addr).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Running
//!
//! ```bash
//! VIEWSTATS_BEARER_TOKEN_SECRET=... PORT=3001 cargo run
//! curl -o stats.bin "http://localhost:3001/viewstats-proxy?handle=%40ExampleChannel&range=28"
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod upstream;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use routes::build_router;
pub use state::AppState;
pub use upstream::{StatsRequest, UpstreamOutcome, ViewStatsClient};
