//! HTTP response building module
//!
//! Builders for every status the server emits. Build failures are logged and
//! degrade to an empty response instead of panicking.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    ACCEPT_RANGES, ALLOW, CACHE_CONTROL, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_RANGE,
    CONTENT_TYPE, ETAG, LAST_MODIFIED, VARY,
};
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};
use std::ops::RangeInclusive;

const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Representation headers shared by 200, 206 and 304 file responses
#[derive(Debug, Clone)]
pub struct FileHeaders<'a> {
    pub content_type: &'a str,
    pub cache_control: &'a str,
    pub etag: &'a str,
    pub last_modified: Option<&'a str>,
    pub content_encoding: Option<&'static str>,
    /// Add `Vary: Accept-Encoding` (compressible representations)
    pub vary_encoding: bool,
    /// Advertise byte-range support
    pub accept_ranges: bool,
}

impl FileHeaders<'_> {
    fn apply(&self, mut builder: Builder) -> Builder {
        builder = builder
            .header(CONTENT_TYPE, self.content_type)
            .header(CACHE_CONTROL, self.cache_control)
            .header(ETAG, self.etag);
        if let Some(last_modified) = self.last_modified {
            builder = builder.header(LAST_MODIFIED, last_modified);
        }
        if let Some(encoding) = self.content_encoding {
            builder = builder.header(CONTENT_ENCODING, encoding);
        }
        if self.vary_encoding {
            builder = builder.header(VARY, "Accept-Encoding");
        }
        if self.accept_ranges {
            builder = builder.header(ACCEPT_RANGES, "bytes");
        }
        builder
    }
}

/// Build 200 OK file response
pub fn build_ok_response(
    body: Bytes,
    headers: &FileHeaders<'_>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = body.len();
    let body = if is_head { Bytes::new() } else { body };

    headers
        .apply(Response::builder().status(StatusCode::OK))
        .header(CONTENT_LENGTH, content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 206 Partial Content response from an already sliced body
pub fn build_partial_response(
    body: Bytes,
    headers: &FileHeaders<'_>,
    range: &RangeInclusive<usize>,
    total_size: usize,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = body.len();
    let body = if is_head { Bytes::new() } else { body };

    headers
        .apply(Response::builder().status(StatusCode::PARTIAL_CONTENT))
        .header(CONTENT_LENGTH, content_length)
        .header(
            CONTENT_RANGE,
            format!("bytes {}-{}/{total_size}", range.start(), range.end()),
        )
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(headers: &FileHeaders<'_>) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(ETAG, headers.etag)
        .header(CACHE_CONTROL, headers.cache_control);
    if let Some(last_modified) = headers.last_modified {
        builder = builder.header(LAST_MODIFIED, last_modified);
    }
    if headers.vary_encoding {
        builder = builder.header(VARY, "Accept-Encoding");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("304", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(ALLOW, ALLOWED_METHODS)
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build OPTIONS response
pub fn build_options_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(ALLOW, ALLOWED_METHODS)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: usize) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_RANGE, format!("bytes */{file_size}"))
        .body(Full::new(Bytes::from("416 Range Not Satisfiable")))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(Full::new(Bytes::from("416 Range Not Satisfiable")))
        })
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<Full<Bytes>> {
    build_text_response(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
}

fn build_text_response(status: StatusCode, text: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CACHE_CONTROL, "no-store")
        .body(Full::new(Bytes::from_static(text.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::from_static(text.as_bytes())))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
