use crate::error::{AppError, AppResult};
use crate::models::ProxyQuery;
use crate::upstream::StatsRequest;

/// Turn a raw proxy query into a [`StatsRequest`].
///
/// A parameter counts as missing when it is absent or empty. Values are not
/// otherwise inspected; the upstream API owns their format.
///
/// # Errors
///
/// Returns `AppError::BadRequest` naming every missing parameter.
pub fn validate_proxy_query(query: &ProxyQuery) -> AppResult<StatsRequest> {
    let handle = non_empty(query.handle.as_deref());
    let range = non_empty(query.range.as_deref());

    match (handle, range) {
        (Some(handle), Some(range)) => Ok(StatsRequest::new(handle, range)),
        (handle, range) => {
            let missing: Vec<&str> = [("handle", handle.is_none()), ("range", range.is_none())]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
            Err(missing_params_error(&missing))
        }
    }
}

/// Build the 400 error for the given missing parameter names.
pub fn missing_params_error(missing: &[&str]) -> AppError {
    let quoted: Vec<String> = missing.iter().map(|name| format!("\"{name}\"")).collect();
    let noun = if missing.len() == 1 {
        "parameter"
    } else {
        "parameters"
    };
    AppError::BadRequest(format!(
        "Missing required query {noun}: {}.",
        quoted.join(", ")
    ))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
