//! HTTP cache control module
//!
//! Provides `If-Modified-Since` validation and freshness header composition.

use chrono::{DateTime, Duration, Utc};
use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, CACHE_CONTROL, DATE, EXPIRES, LAST_MODIFIED,
};

use crate::config::FileHandlerConfig;
use crate::http::date::HttpDateFormat;
use crate::logger;

/// Check if the client's cached copy is still current
///
/// Both sides are compared at whole seconds because the header format
/// carries no sub-second precision. Only an exact match counts; a client
/// date that is newer or older than the file both mean "send it again".
/// A header that does not parse with `format` is ignored.
///
/// # Arguments
/// * `if_modified_since` - Client-sent `If-Modified-Since` header
/// * `last_modified` - File modification time in epoch milliseconds
/// * `format` - Configured header date format
///
/// # Returns
/// Returns true if matched (should return 304), false otherwise
pub fn is_not_modified(
    if_modified_since: Option<&str>,
    last_modified: i64,
    format: &HttpDateFormat,
) -> bool {
    let Some(header) = if_modified_since.filter(|v| !v.is_empty()) else {
        return false;
    };

    format
        .parse_millis(header)
        .is_some_and(|since| since / 1000 == last_modified / 1000)
}

/// `Cache-Control` value for a private response cached for `cache_seconds`
pub fn cache_control_value(cache_seconds: u32) -> String {
    format!("private, max-age={cache_seconds}")
}

/// Set the `Date` header alone, as sent with 304 responses
pub fn set_date_header(headers: &mut HeaderMap, format: &HttpDateFormat, now: DateTime<Utc>) {
    insert_header(headers, DATE, format.format(now));
}

/// Set `Date`, `Expires`, `Cache-Control` and `Last-Modified`
pub fn set_date_and_cache_headers(
    headers: &mut HeaderMap,
    config: &FileHandlerConfig,
    last_modified: i64,
    now: DateTime<Utc>,
) {
    let format = &config.date_format;
    set_date_header(headers, format, now);

    let expires = now + Duration::seconds(i64::from(config.cache_seconds));
    insert_header(headers, EXPIRES, format.format(expires));
    insert_header(headers, CACHE_CONTROL, cache_control_value(config.cache_seconds));
    insert_header(headers, LAST_MODIFIED, format.format_millis(last_modified));
}

/// Insert a formatted value, skipping it if the date pattern produced
/// bytes that are not allowed in a header
fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: String) {
    match HeaderValue::try_from(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(e) => logger::log_warning(&format!("Dropping {name} header: {e}")),
    }
}
