//! Static file serving module
//!
//! Stage 1 of request handling: map a URL path onto a file under the static
//! root, then load its bytes and metadata.

use crate::error::ServeError;
use crate::http::mime;
use crate::logger;
use hyper::body::Bytes;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

const MAX_NAME_LEN: usize = 255;
const MAX_PATH_LEN: usize = 4096;

/// A loaded file under the static root
#[derive(Debug, Clone)]
pub struct StaticFile {
    pub path: PathBuf,
    pub content: Bytes,
    pub content_type: &'static str,
    pub extension: Option<String>,
    pub modified: Option<SystemTime>,
}

/// Resolve a request path to a regular file inside `static_root`
///
/// Returns `Ok(None)` for anything that should fall through to the SPA
/// fallback: undecodable paths, traversal attempts, dotfiles, directories
/// without an index file, and files that do not exist. Any other I/O
/// failure on the way is an error.
pub async fn resolve(
    static_root: &Path,
    url_path: &str,
    index_file: &str,
) -> Result<Option<PathBuf>, ServeError> {
    let Some(relative) = sanitize_path(url_path) else {
        return Ok(None);
    };
    let mut candidate = static_root.join(&relative);

    let Some(meta) = lookup(fs::metadata(&candidate).await, &candidate)? else {
        return Ok(None);
    };
    if meta.is_dir() {
        candidate = candidate.join(index_file);
    }

    // Symlinks may still point outside the root
    let Some(canonical) = lookup(fs::canonicalize(&candidate).await, &candidate)? else {
        return Ok(None);
    };
    if !canonical.starts_with(static_root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {url_path} -> {}",
            canonical.display()
        ));
        return Ok(None);
    }

    let Some(meta) = lookup(fs::metadata(&canonical).await, &canonical)? else {
        return Ok(None);
    };
    Ok(meta.is_file().then_some(canonical))
}

/// Absent entries are misses, every other failure is surfaced
fn lookup<T>(result: io::Result<T>, path: &Path) -> Result<Option<T>, ServeError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => Ok(None),
        Err(source) => Err(ServeError::Resolve {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Turn a URL path into a root-relative filesystem path
///
/// Percent-decodes the path and rejects NUL bytes, `..` segments,
/// dot-prefixed segments and names no filesystem can hold. Empty and `.`
/// segments are dropped.
pub fn sanitize_path(url_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(url_path).ok()?;
    if decoded.contains('\0') || decoded.len() > MAX_PATH_LEN {
        return None;
    }

    let mut relative = PathBuf::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            s if s.starts_with('.') || s.len() > MAX_NAME_LEN => return None,
            s => relative.push(s),
        }
    }

    // Drive prefixes or root components must never survive the join
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then_some(relative)
}

/// Load a resolved file's bytes and metadata
pub async fn load_file(path: &Path) -> Result<StaticFile, ServeError> {
    let meta = fs::metadata(path)
        .await
        .map_err(|source| ServeError::Metadata {
            path: path.to_path_buf(),
            source,
        })?;

    let content = fs::read(path).await.map_err(|source| ServeError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    Ok(StaticFile {
        path: path.to_path_buf(),
        content: Bytes::from(content),
        content_type: mime::get_content_type(extension.as_deref()),
        extension,
        modified: meta.modified().ok(),
    })
}
