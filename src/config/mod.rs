// Configuration module entry point
// Loads the immutable startup configuration and the per-process state derived from it

mod state;
mod types;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

pub use state::AppState;
pub use types::{CompressionConfig, Config, LoggingConfig};

/// Config file read when `SPA_SERVER_CONFIG` is not set
pub const DEFAULT_CONFIG_FILE: &str = "spa-server.toml";

/// Port used when `PORT` is unset
pub const DEFAULT_PORT: u16 = 3000;

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Precedence, lowest first: defaults, config file, `SPA_*` variables, `PORT`.
    /// A file named by `SPA_SERVER_CONFIG` must exist; the default one may not.
    pub fn load() -> Result<Self, config::ConfigError> {
        let port = std::env::var("PORT").ok();
        match std::env::var("SPA_SERVER_CONFIG") {
            Ok(path) => Self::build(&path, true, port, None),
            Err(_) => Self::build(DEFAULT_CONFIG_FILE, false, port, None),
        }
    }

    /// Load configuration from an optional file path.
    ///
    /// `env` replaces the process environment for the `SPA_*` source when given.
    pub fn load_from(
        config_path: &str,
        port: Option<String>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        Self::build(config_path, false, port, env)
    }

    fn build(
        config_path: &str,
        required: bool,
        port: Option<String>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let environment = config::Environment::with_prefix("SPA")
            .prefix_separator("_")
            .separator("__")
            .source(env);

        let settings = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("server.server_name", "spa-server")?
            .set_default("assets.root", "dist")?
            .set_default("assets.fallback", "index.html")?
            .set_default("assets.index_file", "index.html")?
            .set_default("compression.enabled", true)?
            .set_default("compression.min_bytes", 1024)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.idle_timeout", 60)?
            .set_default("performance.shutdown_grace", 10)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .add_source(config::File::with_name(config_path).required(required))
            .add_source(environment)
            .set_override_option("server.port", port)?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        for (key, name) in [
            ("assets.fallback", &self.assets.fallback),
            ("assets.index_file", &self.assets.index_file),
        ] {
            let path = Path::new(name);
            let escapes = path
                .components()
                .any(|c| !matches!(c, std::path::Component::Normal(_)));
            if name.is_empty() || escapes {
                return Err(config::ConfigError::Message(format!(
                    "{key} must be a relative path inside the static root, got '{name}'"
                )));
            }
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        let host = self.server.host.as_str();
        // Bare IPv6 literals need brackets before a port can be appended
        let addr = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{}", self.server.port)
        } else {
            format!("{host}:{}", self.server.port)
        };
        addr.parse().map_err(|e| format!("Invalid address '{addr}': {e}"))
    }
}
