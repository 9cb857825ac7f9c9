use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

/// Header carrying the admin API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Constant-time string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Whether `headers` carry the configured admin key.
///
/// Without a configured key every request is rejected.
pub fn is_authorized(configured: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(expected) = configured.filter(|key| !key.is_empty()) else {
        return false;
    };

    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|provided| constant_time_compare(provided, expected))
}
