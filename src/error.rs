//! Error types
//!
//! Request-level failures map onto HTTP status codes in the router;
//! startup failures are fatal and bubble up to `main`.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Failure on a filesystem entry that exists but cannot be served.
///
/// Always surfaced as `500 Internal Server Error`, never retried.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to resolve '{}': {source}", path.display())]
    Resolve {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read metadata for '{}': {source}", path.display())]
    Metadata {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ServeError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Resolve { path, .. } | Self::Metadata { path, .. } | Self::Read { path, .. } => {
                path
            }
        }
    }

    /// The file vanished between resolution and loading (or never existed)
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Resolve { source, .. }
            | Self::Metadata { source, .. }
            | Self::Read { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
        }
    }
}

/// Listener could not be created (port in use, permission denied, ...).
#[derive(Debug, Error)]
#[error("failed to bind {addr}: {source}")]
pub struct BindError {
    pub addr: SocketAddr,
    pub source: std::io::Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_serve_error_display_and_source() {
        let err = ServeError::Read {
            path: PathBuf::from("dist/app.js"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "failed to read 'dist/app.js': denied");
        assert_eq!(err.path(), std::path::Path::new("dist/app.js"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_bind_error_display() {
        let err = BindError {
            addr: "127.0.0.1:3000".parse().unwrap(),
            source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        };
        assert_eq!(
            err.to_string(),
            "failed to bind 127.0.0.1:3000: address in use"
        );
    }
}
