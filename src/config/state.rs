// Application state module
// Read-only values derived from the configuration once at startup

use std::path::{Path, PathBuf};

use super::types::Config;
use crate::logger;

/// Application state shared by every connection.
///
/// Nothing here is mutated after construction.
pub struct AppState {
    pub config: Config,
    /// Canonical static root, `None` when the directory does not exist
    pub static_root: Option<PathBuf>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let static_root = match Path::new(&config.assets.root).canonicalize() {
            Ok(root) if root.is_dir() => Some(root),
            Ok(root) => {
                logger::log_warning(&format!(
                    "Static root '{}' is not a directory, every request will miss",
                    root.display()
                ));
                None
            }
            Err(e) => {
                logger::log_warning(&format!(
                    "Static root '{}' not accessible: {e}",
                    config.assets.root
                ));
                None
            }
        };

        if let Some(root) = &static_root {
            let fallback = root.join(&config.assets.fallback);
            if !fallback.is_file() {
                logger::log_warning(&format!(
                    "Fallback document '{}' not found, unmatched paths will return 404",
                    fallback.display()
                ));
            }
        }

        Self {
            config,
            static_root,
        }
    }

    /// Absolute path of the SPA entry document
    pub fn fallback_path(&self) -> Option<PathBuf> {
        self.static_root
            .as_ref()
            .map(|root| root.join(&self.config.assets.fallback))
    }
}
