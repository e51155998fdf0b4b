use std::borrow::Cow;

use tokio::signal;
use tracing::{error, warn};

/// Placeholder written wherever the bearer token would appear in logs.
pub const REDACTED: &str = "[TOKEN_REDACTED]";

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed. This is a critical
/// initialization failure that should halt the application.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            panic!("Critical: cannot install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                panic!("Critical: cannot install SIGTERM signal handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

/// Replace every occurrence of `secret` in `text` with [`REDACTED`].
///
/// Borrows when there is nothing to redact.
pub fn redact<'a>(text: &'a str, secret: &str) -> Cow<'a, str> {
    if secret.is_empty() || !text.contains(secret) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace(secret, REDACTED))
}

/// Lossy UTF-8 view of at most `limit` bytes of `body`, for log lines.
pub fn lossy_preview(body: &[u8], limit: usize) -> String {
    let head = body.get(..limit).unwrap_or(body);
    let mut preview = String::from_utf8_lossy(head).into_owned();
    if body.len() > limit {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_replaces_all_occurrences() {
        let out = redact("a=tok&b=tok", "tok");
        assert_eq!(out, "a=[TOKEN_REDACTED]&b=[TOKEN_REDACTED]");
    }

    #[test]
    fn test_redact_borrows_when_clean() {
        let out = redact("https://api.viewstats.com/channels/x/stats", "tok-123");
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn test_redact_empty_secret_is_noop() {
        assert_eq!(redact("anything", ""), "anything");
    }

    #[test]
    fn test_lossy_preview_truncates() {
        assert_eq!(lossy_preview(b"abcdef", 3), "abc...");
        assert_eq!(lossy_preview(b"abc", 3), "abc");
    }

    #[test]
    fn test_lossy_preview_invalid_utf8() {
        assert_eq!(lossy_preview(&[0x66, 0xff, 0x6f], 16), "f\u{fffd}o");
    }
}
