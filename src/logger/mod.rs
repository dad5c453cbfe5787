//! Logger module
//!
//! Provides logging utilities for the server including:
//! - Startup and shutdown logging
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::{version_label, AccessLogEntry};

use crate::config::{Config, LoggingConfig};
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    writer::init(
        config.access_log_file.as_deref(),
        config.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Static asset server started");
    write_info(&format!("Listening on port {} (http://{addr})", addr.port()));
    write_info(&format!("Static root: {}", config.assets.root));
    write_info(&format!("Fallback document: {}", config.assets.fallback));
    if config.compression.enabled {
        write_info(&format!(
            "Gzip: on (min {} bytes)",
            config.compression.min_bytes
        ));
    } else {
        write_info("Gzip: off");
    }
    match config.server.workers {
        Some(workers) => write_info(&format!("Worker threads: {workers}")),
        None => write_info("Worker threads: default (CPU cores)"),
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================");
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    write_error(&format!("[ERROR] Failed to serve connection: {err}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_info(message: &str) {
    write_info(&format!("[INFO] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}

pub fn log_shutdown_signal(signal: &str) {
    write_info(&format!("[SHUTDOWN] {signal} received, no longer accepting connections"));
}

pub fn log_shutdown_complete(drained: bool, remaining: usize) {
    if drained {
        write_info("[SHUTDOWN] All connections closed, exiting");
    } else {
        write_error(&format!(
            "[WARN] Shutdown grace period elapsed with {remaining} connection(s) still open"
        ));
    }
}
