//! HTTP cache control module
//!
//! Provides the extension-based `Cache-Control` policy table, `ETag` and
//! `Last-Modified` generation, and conditional request evaluation.

use chrono::{DateTime, Utc};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::SystemTime;

/// Browsers must revalidate before reuse
pub const REVALIDATE: &str = "public, max-age=0";

/// Fingerprinted build output, cacheable for a year
pub const LONG_LIVED: &str = "public, max-age=31536000";

/// Applied to files whose extension matches no rule
pub const DEFAULT_CACHE_CONTROL: &str = REVALIDATE;

/// One row of the cache policy table
#[derive(Debug, Clone, Copy)]
pub struct CacheRule {
    pub extensions: &'static [&'static str],
    pub cache_control: &'static str,
}

/// Cache policy table, first matching row wins
pub const CACHE_RULES: &[CacheRule] = &[
    CacheRule {
        extensions: &["html"],
        cache_control: REVALIDATE,
    },
    CacheRule {
        extensions: &["js", "css", "json"],
        cache_control: LONG_LIVED,
    },
    CacheRule {
        extensions: &["jpg", "jpeg", "png", "webp", "svg"],
        cache_control: LONG_LIVED,
    },
];

/// Look up the `Cache-Control` value for a file extension
///
/// Returns `None` when no rule covers the extension.
pub fn cache_control_for(extension: Option<&str>) -> Option<&'static str> {
    let ext = extension?;
    CACHE_RULES
        .iter()
        .find(|rule| rule.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .map(|rule| rule.cache_control)
}

/// Generate `ETag` using fast hashing
///
/// Returns a quoted strong `ETag`, e.g. `"1f-abc123def"`.
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("\"{:x}-{:x}\"", content.len(), hasher.finish())
}

/// Turn a strong `ETag` into a weak one (`W/"..."`)
pub fn weaken_etag(etag: &str) -> String {
    if etag.starts_with("W/") {
        etag.to_string()
    } else {
        format!("W/{etag}")
    }
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Uses weak comparison and supports lists and the `*` wildcard.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    let ours = etag.trim_start_matches("W/");
    if_none_match.is_some_and(|header| {
        header.split(',').map(str::trim).any(|candidate| {
            candidate == "*" || candidate.trim_start_matches("W/") == ours
        })
    })
}

/// Format a timestamp as an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`)
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Parse an HTTP date header value
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Decide whether a conditional GET can be answered with `304 Not Modified`
///
/// `If-None-Match` takes precedence; `If-Modified-Since` is only consulted
/// when it is absent, at one-second resolution.
pub fn is_not_modified(
    if_none_match: Option<&str>,
    if_modified_since: Option<&str>,
    etag: &str,
    last_modified: Option<SystemTime>,
) -> bool {
    if if_none_match.is_some() {
        return check_etag_match(if_none_match, etag);
    }

    match (if_modified_since.and_then(parse_http_date), last_modified) {
        (Some(since), Some(modified)) => {
            DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_html_revalidates() {
        assert_eq!(cache_control_for(Some("html")), Some("public, max-age=0"));
        assert_eq!(cache_control_for(Some("HTML")), Some("public, max-age=0"));
    }

    #[test]
    fn test_long_lived_assets() {
        for ext in ["js", "css", "json", "jpg", "jpeg", "png", "webp", "svg"] {
            assert_eq!(
                cache_control_for(Some(ext)),
                Some("public, max-age=31536000"),
                "extension {ext}"
            );
        }
    }

    #[test]
    fn test_unmatched_extension() {
        assert_eq!(cache_control_for(Some("woff2")), None);
        assert_eq!(cache_control_for(Some("txt")), None);
        assert_eq!(cache_control_for(None), None);
    }

    #[test]
    fn test_generate_etag() {
        let etag = generate_etag(b"hello world");
        assert!(etag.starts_with("\"b-"));
        assert!(etag.ends_with('"'));
        assert_eq!(etag, generate_etag(b"hello world"));
        assert_ne!(etag, generate_etag(b"hello there"));
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "\"abc123\"";
        assert!(check_etag_match(Some("\"abc123\""), etag));
        assert!(check_etag_match(Some("\"xyz\", \"abc123\""), etag));
        assert!(check_etag_match(Some("W/\"abc123\""), etag));
        assert!(check_etag_match(Some("\"abc123\""), &weaken_etag(etag)));
        assert!(check_etag_match(Some("*"), etag));
        assert!(!check_etag_match(Some("\"different\""), etag));
        assert!(!check_etag_match(None, etag));
    }

    #[test]
    fn test_weaken_etag_idempotent() {
        assert_eq!(weaken_etag("\"a\""), "W/\"a\"");
        assert_eq!(weaken_etag("W/\"a\""), "W/\"a\"");
    }

    #[test]
    fn test_http_date_round_trip() {
        let time = UNIX_EPOCH + Duration::from_secs(784_111_777);
        let formatted = format_http_date(time);
        assert_eq!(formatted, "Sun, 06 Nov 1994 08:49:37 GMT");
        assert_eq!(parse_http_date(&formatted).unwrap().timestamp(), 784_111_777);
        assert!(parse_http_date("yesterday").is_none());
    }

    #[test]
    fn test_if_modified_since() {
        let modified = UNIX_EPOCH + Duration::from_millis(784_111_777_500);
        let same_second = "Sun, 06 Nov 1994 08:49:37 GMT";
        let earlier = "Sun, 06 Nov 1994 08:49:36 GMT";
        assert!(is_not_modified(None, Some(same_second), "\"x\"", Some(modified)));
        assert!(!is_not_modified(None, Some(earlier), "\"x\"", Some(modified)));
        assert!(!is_not_modified(None, Some(same_second), "\"x\"", None));
    }

    #[test]
    fn test_if_none_match_takes_precedence() {
        let modified = UNIX_EPOCH + Duration::from_secs(784_111_777);
        let since = "Sun, 06 Nov 1994 08:49:37 GMT";
        assert!(!is_not_modified(Some("\"other\""), Some(since), "\"x\"", Some(modified)));
        assert!(is_not_modified(Some("\"x\""), None, "\"x\"", Some(modified)));
    }
}
