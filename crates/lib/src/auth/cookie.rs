//! Cookie header parsing.

use axum::http::{header, HeaderMap};

/// Value of the first cookie named `name` across all `Cookie` headers, percent-decoded.
/// Empty values count as absent.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(cookie_str) = value.to_str() else {
            continue;
        };
        for pair in cookie_str.split(';') {
            let Some((key, raw)) = pair.trim().split_once('=') else {
                continue;
            };
            if key.trim() != name {
                continue;
            }
            let raw = raw.trim().trim_matches('"');
            if raw.is_empty() {
                return None;
            }
            return Some(
                urlencoding::decode(raw)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| raw.to_string()),
            );
        }
    }
    None
}
