//! HTTP Range request parsing module
//!
//! Single `bytes=` ranges per RFC 9110; multi-range requests are answered
//! with the full representation.

use std::ops::RangeInclusive;

/// Outcome of evaluating a `Range` header against a body length
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteRange {
    /// No usable Range header, send the whole body
    Full,
    /// Send the inclusive byte span
    Partial(RangeInclusive<usize>),
    /// Range starts past the end of the body, answer 416
    Unsatisfiable,
}

/// Parse a `Range` header value
///
/// Supported forms: `bytes=start-end`, `bytes=start-`, `bytes=-suffix`.
/// Anything else (other units, multiple ranges, garbage) yields
/// [`ByteRange::Full`].
pub fn parse_range_header(range_header: Option<&str>, len: usize) -> ByteRange {
    let Some(spec) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return ByteRange::Full;
    };
    if spec.contains(',') {
        return ByteRange::Full;
    }
    let Some((first, last)) = spec.split_once('-') else {
        return ByteRange::Full;
    };

    match (first.trim(), last.trim()) {
        ("", "") => ByteRange::Full,
        ("", suffix) => match suffix.parse::<usize>() {
            Ok(0) => ByteRange::Unsatisfiable,
            Ok(_) if len == 0 => ByteRange::Unsatisfiable,
            Ok(n) => ByteRange::Partial(len.saturating_sub(n)..=len - 1),
            Err(_) => ByteRange::Full,
        },
        (start, end) => {
            let Ok(start) = start.parse::<usize>() else {
                return ByteRange::Full;
            };
            let end = if end.is_empty() {
                None
            } else {
                match end.parse::<usize>() {
                    Ok(e) => Some(e),
                    Err(_) => return ByteRange::Full,
                }
            };

            if end.is_some_and(|e| e < start) {
                // Syntactically invalid, ignored per RFC 9110 14.1.1
                return ByteRange::Full;
            }
            if start >= len {
                return ByteRange::Unsatisfiable;
            }
            let end = end.map_or(len - 1, |e| e.min(len - 1));
            ByteRange::Partial(start..=end)
        }
    }
}
