// Configuration types module
// Typed sections deserialized from defaults, the TOML file and the environment

use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure, built once at startup and never mutated
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub assets: AssetsConfig,
    pub compression: CompressionConfig,
    pub performance: PerformanceConfig,
    pub logging: LoggingConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Tokio worker threads (CPU cores when unset)
    #[serde(default)]
    pub workers: Option<usize>,
    /// Value of the `Server` response header
    pub server_name: String,
}

/// Static root and fallback document
#[derive(Debug, Deserialize, Clone)]
pub struct AssetsConfig {
    /// Directory holding the built assets
    pub root: String,
    /// SPA entry document, relative to `root`
    pub fallback: String,
    /// File served for directory requests
    pub index_file: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompressionConfig {
    pub enabled: bool,
    /// Bodies smaller than this are sent uncompressed
    pub min_bytes: usize,
}

/// Connection handling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Seconds a connection may sit without delivering request headers
    pub idle_timeout: u64,
    /// Seconds in-flight connections get to finish after a shutdown signal
    pub shutdown_grace: u64,
    #[serde(default)]
    pub max_connections: Option<usize>,
}

impl PerformanceConfig {
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }

    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace)
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}
