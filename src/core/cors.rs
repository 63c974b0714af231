//! Headers applied to every response the pipeline handles.
use axum::response::Response;
use http::{HeaderMap, HeaderValue, header};
use tracing::debug;

use crate::config::ApiConfig;

pub const CACHE_CONTROL_VALUE: &str = "no-cache, no-store, must-revalidate";
pub const PRAGMA_VALUE: &str = "no-cache";
pub const EXPIRES_VALUE: &str = "Mon, 01 Jan 1990 00:00:00 GMT";

/// Make the response uncacheable.
pub fn apply_cache_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(CACHE_CONTROL_VALUE),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static(PRAGMA_VALUE));
    headers.insert(header::EXPIRES, HeaderValue::from_static(EXPIRES_VALUE));
}

/// Echo the origin back when it matches the configured pattern.
///
/// Returns whether CORS headers were added.
pub fn apply_cors_headers(
    config: &ApiConfig,
    origin: Option<&HeaderValue>,
    headers: &mut HeaderMap,
) -> bool {
    let Some(allowed) = &config.cors_allow_origin_regex else {
        return false;
    };
    let Some(origin) = origin else {
        return false;
    };
    let Ok(origin_text) = origin.to_str() else {
        return false;
    };
    if !allowed.is_match(origin_text) {
        debug!(origin = origin_text, "Origin rejected for CORS");
        return false;
    }

    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());

    let allow_headers = config
        .cors_allow_headers
        .as_deref()
        .unwrap_or_default()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow_headers) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, value);
    }

    if let Some(allow) = headers.get(header::ALLOW).cloned() {
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, allow);
    }

    if let Some(max_age) = config.cors_max_age {
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(max_age));
    }

    true
}

/// Cache prevention, `WWW-Authenticate` removal, then CORS.
pub fn finalize_response(config: &ApiConfig, origin: Option<&HeaderValue>, response: &mut Response) {
    let headers = response.headers_mut();

    apply_cache_headers(headers);
    // A browser would answer this header with a basic-auth dialog.
    headers.remove(header::WWW_AUTHENTICATE);
    apply_cors_headers(config, origin, headers);
}
