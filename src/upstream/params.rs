//! Request parameters and URL construction for the ViewStats stats endpoint.

use url::form_urlencoded;

/// Query parameters appended to every stats request.
///
/// These are dictated by the upstream API and are never caller-controlled.
pub const FIXED_QUERY: &str = "groupBy=daily&sortOrder=ASC&withRevenue=true&withEvents=true&withBreakdown=false&withToday=false";

/// Validated parameters for a single channel stats lookup.
///
/// Both values are opaque to the proxy: `handle` is percent-encoded into the
/// path, `range` is forwarded verbatim.
///
/// # Example
///
/// ```rust,ignore
/// let request = StatsRequest::new("@ExampleChannel", "28");
/// let url = build_stats_url("https://api.viewstats.com", &request);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsRequest {
    /// Channel handle, e.g. `@ExampleChannel`
    pub handle: String,
    /// Time-range token, e.g. `28` or `alltime`
    pub range: String,
}

impl StatsRequest {
    /// Create a new stats request.
    pub fn new(handle: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            range: range.into(),
        }
    }
}

/// Build the upstream stats URL for `request` under `base_url`.
///
/// `base_url` must not end with a slash; [`crate::Config`] normalizes it.
pub fn build_stats_url(base_url: &str, request: &StatsRequest) -> String {
    format!(
        "{base_url}/channels/{}/stats?range={}&{FIXED_QUERY}",
        encode_path_segment(&request.handle),
        request.range
    )
}

/// Whether `range` can change the shape of the upstream query string.
///
/// `&` injects extra parameters ahead of the fixed ones and `#` turns
/// everything after it, fixed parameters included, into a fragment that is
/// never sent. The value is still forwarded verbatim.
pub fn range_alters_query(range: &str) -> bool {
    range.contains(['&', '#'])
}

/// Percent-encode a single path segment.
///
/// Leaves ASCII alphanumerics and `*-._` untouched; everything else,
/// including `@`, `/` and `?`, is escaped. Spaces become `%20`.
pub fn encode_path_segment(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes())
        .map(|chunk| if chunk == "+" { "%20" } else { chunk })
        .collect()
}
