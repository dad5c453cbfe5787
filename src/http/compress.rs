//! Response compression module
//!
//! `Accept-Encoding` negotiation and gzip encoding of response bodies.

use crate::config::CompressionConfig;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Write};

/// Content coding chosen for a response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Identity,
    Gzip,
}

impl Encoding {
    /// Value for the `Content-Encoding` header, `None` for identity
    pub const fn header_value(self) -> Option<&'static str> {
        match self {
            Self::Identity => None,
            Self::Gzip => Some("gzip"),
        }
    }
}

/// Check whether an `Accept-Encoding` header admits gzip
///
/// An explicit `gzip` (or `x-gzip`) entry wins over `*`; `q=0` refuses.
pub fn accepts_gzip(accept_encoding: Option<&str>) -> bool {
    let Some(header) = accept_encoding else {
        return false;
    };

    let mut explicit = None;
    let mut wildcard = None;

    for entry in header.split(',') {
        let mut params = entry.split(';').map(str::trim);
        let coding = params.next().unwrap_or_default().to_ascii_lowercase();
        let q = params
            .find_map(|p| p.strip_prefix("q=").or_else(|| p.strip_prefix("Q=")))
            .map_or(1.0, |v| v.trim().parse::<f32>().unwrap_or(0.0));

        match coding.as_str() {
            "gzip" | "x-gzip" => explicit = Some(q),
            "*" => wildcard = Some(q),
            _ => {}
        }
    }

    explicit.or(wildcard).is_some_and(|q| q > 0.0)
}

/// Check whether a `Content-Type` benefits from compression
///
/// Already-compressed formats (images other than SVG, fonts, media,
/// archives) are skipped.
pub fn is_compressible(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence.starts_with("text/")
        || matches!(
            essence.as_str(),
            "application/javascript"
                | "application/json"
                | "application/manifest+json"
                | "application/xml"
                | "application/wasm"
                | "image/svg+xml"
                | "image/x-icon"
        )
}

/// Choose the body encoding for a response
pub fn negotiate(
    config: &CompressionConfig,
    accept_encoding: Option<&str>,
    content_type: &str,
    body_len: usize,
) -> Encoding {
    if config.enabled
        && body_len >= config.min_bytes
        && is_compressible(content_type)
        && accepts_gzip(accept_encoding)
    {
        Encoding::Gzip
    } else {
        Encoding::Identity
    }
}

/// Gzip-compress a body at the default compression level
pub fn gzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn enabled(min_bytes: usize) -> CompressionConfig {
        CompressionConfig {
            enabled: true,
            min_bytes,
        }
    }

    #[test]
    fn test_accepts_gzip() {
        assert!(accepts_gzip(Some("gzip")));
        assert!(accepts_gzip(Some("gzip, deflate, br")));
        assert!(accepts_gzip(Some("br;q=1.0, GZIP;q=0.5")));
        assert!(accepts_gzip(Some("*")));
        assert!(accepts_gzip(Some("x-gzip")));
        assert!(!accepts_gzip(Some("gzip;q=0")));
        assert!(!accepts_gzip(Some("*;q=0.5, gzip;q=0")));
        assert!(!accepts_gzip(Some("deflate, br")));
        assert!(!accepts_gzip(Some("identity")));
        assert!(!accepts_gzip(None));
    }

    #[test]
    fn test_is_compressible() {
        assert!(is_compressible("text/html; charset=utf-8"));
        assert!(is_compressible("text/css"));
        assert!(is_compressible("application/javascript; charset=utf-8"));
        assert!(is_compressible("application/json"));
        assert!(is_compressible("image/svg+xml"));
        assert!(!is_compressible("image/png"));
        assert!(!is_compressible("image/webp"));
        assert!(!is_compressible("font/woff2"));
        assert!(!is_compressible("application/octet-stream"));
    }

    #[test]
    fn test_negotiate_threshold_and_type() {
        let cfg = enabled(1024);
        assert_eq!(
            negotiate(&cfg, Some("gzip"), "text/css", 2048),
            Encoding::Gzip
        );
        assert_eq!(
            negotiate(&cfg, Some("gzip"), "text/css", 1023),
            Encoding::Identity
        );
        assert_eq!(
            negotiate(&cfg, Some("gzip"), "image/png", 1 << 20),
            Encoding::Identity
        );
        assert_eq!(negotiate(&cfg, None, "text/css", 2048), Encoding::Identity);

        let disabled = CompressionConfig {
            enabled: false,
            min_bytes: 0,
        };
        assert_eq!(
            negotiate(&disabled, Some("gzip"), "text/css", 2048),
            Encoding::Identity
        );
    }

    #[test]
    fn test_gzip_decodes_to_original() {
        let original = "body { color: red; }\n".repeat(200);
        let compressed = gzip(original.as_bytes()).unwrap();
        assert!(compressed.len() < original.len());

        let mut decoded = String::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_header_value() {
        assert_eq!(Encoding::Gzip.header_value(), Some("gzip"));
        assert_eq!(Encoding::Identity.header_value(), None);
    }
}
