//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Every request runs the same
//! two-stage pipeline: resolve a static file, otherwise serve the SPA
//! fallback document.

use crate::config::{AppState, CompressionConfig};
use crate::handler::static_files::{self, StaticFile};
use crate::http::{self, cache, compress, ByteRange, FileHeaders};
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body as _, Bytes};
use hyper::header::{
    HeaderMap, HeaderValue, ACCEPT_ENCODING, IF_MODIFIED_SINCE, IF_NONE_MATCH, RANGE, REFERER,
    SERVER, USER_AGENT,
};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
    pub range_header: Option<&'a str>,
    pub accept_encoding: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    fn from_parts(parts: &'a Parts) -> Self {
        let headers = &parts.headers;
        Self {
            path: parts.uri.path(),
            is_head: parts.method == Method::HEAD,
            if_none_match: header_str(headers, &IF_NONE_MATCH),
            if_modified_since: header_str(headers, &IF_MODIFIED_SINCE),
            range_header: header_str(headers, &RANGE),
            accept_encoding: header_str(headers, &ACCEPT_ENCODING),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &hyper::header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    // Request bodies carry nothing this server uses
    let (parts, _) = req.into_parts();
    let mut response = respond(&parts, &state).await;

    if let Ok(server_name) = HeaderValue::from_str(&state.config.server.server_name) {
        response.headers_mut().insert(SERVER, server_name);
    }

    let logging = &state.config.logging;
    if logging.access_log {
        let entry = access_entry(&parts, &response, peer_addr, started);
        logger::log_access(&entry, &logging.access_log_format);
    }

    Ok(response)
}

async fn respond(parts: &Parts, state: &AppState) -> Response<Full<Bytes>> {
    // 1. Check HTTP method
    if let Some(resp) = check_http_method(&parts.method) {
        return resp;
    }

    let ctx = RequestContext::from_parts(parts);

    // 2. Static file under the root
    if let Some(root) = &state.static_root {
        let index_file = &state.config.assets.index_file;
        let loaded = match static_files::resolve(root, ctx.path, index_file).await {
            Ok(Some(path)) => Some(static_files::load_file(&path).await),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        };
        match loaded {
            Some(Ok(file)) => {
                let cache_control = cache::cache_control_for(file.extension.as_deref())
                    .unwrap_or(cache::DEFAULT_CACHE_CONTROL);
                return serve_file(&ctx, &file, cache_control, true, &state.config.compression);
            }
            Some(Err(e)) => {
                logger::log_error(&e.to_string());
                return http::build_500_response();
            }
            None => {}
        }
    }

    // 3. Everything else gets the SPA entry document
    serve_fallback(&ctx, state).await
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Serve the fallback document regardless of the requested path
async fn serve_fallback(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let Some(path) = state.fallback_path() else {
        logger::log_warning(&format!(
            "No static root, cannot serve fallback for {}",
            ctx.path
        ));
        return http::build_404_response();
    };

    match static_files::load_file(&path).await {
        Ok(file) => serve_file(
            ctx,
            &file,
            cache::REVALIDATE,
            false,
            &state.config.compression,
        ),
        Err(e) if e.is_not_found() => {
            logger::log_warning(&format!(
                "Fallback document missing: {}",
                e.path().display()
            ));
            http::build_404_response()
        }
        Err(e) => {
            logger::log_error(&e.to_string());
            http::build_500_response()
        }
    }
}

/// Build the response for a loaded file: 304, 206/416, or 200 (maybe gzip)
fn serve_file(
    ctx: &RequestContext<'_>,
    file: &StaticFile,
    cache_control: &str,
    allow_range: bool,
    compression: &CompressionConfig,
) -> Response<Full<Bytes>> {
    let total_size = file.content.len();
    let strong_etag = cache::generate_etag(&file.content);
    let last_modified = file.modified.map(cache::format_http_date);
    let encoding = compress::negotiate(
        compression,
        ctx.accept_encoding,
        file.content_type,
        total_size,
    );

    // Encoded bytes differ from the file, so only a weak validator applies
    let etag = match encoding {
        compress::Encoding::Gzip => cache::weaken_etag(&strong_etag),
        compress::Encoding::Identity => strong_etag.clone(),
    };

    let mut headers = FileHeaders {
        content_type: file.content_type,
        cache_control,
        etag: &etag,
        last_modified: last_modified.as_deref(),
        content_encoding: None,
        vary_encoding: compression.enabled && compress::is_compressible(file.content_type),
        accept_ranges: allow_range,
    };

    if cache::is_not_modified(
        ctx.if_none_match,
        ctx.if_modified_since,
        &etag,
        file.modified,
    ) {
        return http::build_304_response(&headers);
    }

    if allow_range {
        match http::parse_range_header(ctx.range_header, total_size) {
            ByteRange::Partial(range) => {
                let partial = FileHeaders {
                    etag: &strong_etag,
                    ..headers
                };
                let body = file.content.slice(range.clone());
                return http::build_partial_response(
                    body,
                    &partial,
                    &range,
                    total_size,
                    ctx.is_head,
                );
            }
            ByteRange::Unsatisfiable => return http::build_416_response(total_size),
            ByteRange::Full => {}
        }
    }

    let body = match encoding {
        compress::Encoding::Gzip => match compress::gzip(&file.content) {
            Ok(compressed) => {
                headers.content_encoding = encoding.header_value();
                Bytes::from(compressed)
            }
            Err(e) => {
                logger::log_warning(&format!(
                    "Gzip failed for '{}', sending identity: {e}",
                    file.path.display()
                ));
                headers.etag = &strong_etag;
                file.content.clone()
            }
        },
        compress::Encoding::Identity => file.content.clone(),
    };

    http::build_ok_response(body, &headers, ctx.is_head)
}

fn access_entry(
    parts: &Parts,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = logger::version_label(parts.version);
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
    entry.referer = header_str(&parts.headers, &REFERER).map(ToString::to_string);
    entry.user_agent = header_str(&parts.headers, &USER_AGENT).map(ToString::to_string);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}
