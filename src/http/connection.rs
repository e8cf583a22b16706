//! Connection persistence helpers

use hyper::header::{HeaderMap, CONNECTION};
use hyper::Version;

/// Whether the client asked for the connection to stay open
///
/// HTTP/1.1 and later are persistent unless `Connection: close` is sent;
/// HTTP/1.0 is persistent only with an explicit `Connection: keep-alive`.
pub fn is_keep_alive(version: Version, headers: &HeaderMap) -> bool {
    let has_token = |token: &str| {
        headers.get_all(CONNECTION).iter().any(|value| {
            value
                .to_str()
                .is_ok_and(|v| v.split(',').any(|t| t.trim().eq_ignore_ascii_case(token)))
        })
    };

    if has_token("close") {
        return false;
    }

    match version {
        Version::HTTP_09 => false,
        Version::HTTP_10 => has_token("keep-alive"),
        _ => true,
    }
}
