//! # Configuration
//!
//! `streamline.toml` settings. Every field is optional; CLI flags override
//! whatever the file says.
//!
//! ```toml
//! parallel = true
//! threads = 4
//! roster = "fixtures/roster.toml"
//! json_mode = false
//! ```

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "streamline.toml";

/// Runner configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamlineConfig {
    /// Evaluate demo pipelines in parallel mode.
    pub parallel: bool,
    /// Worker count for the global rayon pool. `None` keeps rayon's default.
    pub threads: Option<usize>,
    /// Roster fixture (`.toml` or `.json`). `None` uses the sample roster.
    pub roster: Option<PathBuf>,
    /// Print demo output as JSON.
    pub json_mode: bool,
}

impl StreamlineConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        toml::from_str(text).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Load the configuration for a run.
    ///
    /// An explicit path must exist. Without one, `streamline.toml` in `dir`
    /// is used when present and defaults otherwise.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self, AppError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = dir.join(DEFAULT_CONFIG_FILE);
                if !candidate.is_file() {
                    tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let text = fs::read_to_string(&path).map_err(|e| {
            AppError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "Loaded configuration");
        Ok(config)
    }

    /// Size the global rayon pool from `threads`.
    ///
    /// The global pool can only be built once per process; later calls
    /// keep the existing pool and log a warning.
    pub fn configure_thread_pool(&self) {
        let Some(threads) = self.threads else {
            return;
        };
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
            Ok(()) => tracing::info!(threads, "Configured worker pool"),
            Err(e) => tracing::warn!(threads, error = %e, "Worker pool already configured"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
