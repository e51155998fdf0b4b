use serde::Deserialize;

/// Raw query string of `GET /viewstats-proxy`.
///
/// Both fields are optional at this layer so that a missing parameter yields
/// a descriptive 400 instead of a generic extractor rejection. See
/// [`crate::validation::validate_proxy_query`] for the typed form.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProxyQuery {
    /// Channel handle forwarded to the upstream path
    pub handle: Option<String>,
    /// Time-range token forwarded verbatim
    pub range: Option<String>,
}
