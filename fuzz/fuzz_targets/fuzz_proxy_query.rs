//! Fuzz testing for proxy query validation and upstream URL construction.
//!
//! Checks, for arbitrary `handle`/`range` strings, that:
//!
//! - Validation never panics
//! - The encoded handle never leaks a path or query delimiter
//! - The built URL always parses and keeps the upstream host and path prefix
//!
//! # Running
//!
//! ```bash
//! cargo +nightly install cargo-fuzz
//! cargo +nightly fuzz run fuzz_proxy_query -- -max_total_time=60
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use viewstats_proxy::models::ProxyQuery;
use viewstats_proxy::upstream::{build_stats_url, encode_path_segment};
use viewstats_proxy::validation::validate_proxy_query;

const BASE: &str = "https://api.viewstats.com";

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    // First NUL splits handle from range
    let (handle, range) = s.split_once('\0').unwrap_or((s, "28"));

    let query = ProxyQuery {
        handle: Some(handle.to_string()),
        range: Some(range.to_string()),
    };

    let Ok(request) = validate_proxy_query(&query) else {
        return;
    };

    let encoded = encode_path_segment(&request.handle);
    assert!(!encoded.contains(['/', '?', '#', ' ']));

    let url = build_stats_url(BASE, &request);
    if let Ok(parsed) = url::Url::parse(&url) {
        assert_eq!(parsed.host_str(), Some("api.viewstats.com"));
        assert!(parsed.path().starts_with("/channels/"));
    }
});
