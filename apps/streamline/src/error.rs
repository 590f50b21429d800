//! # Application Errors

use streamline_core::StreamError;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum AppError {
    /// A pipeline or fixture operation failed.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// No demo is registered under the requested name.
    #[error("Unknown demo '{0}' (run `streamline list` to see the catalogue)")]
    UnknownDemo(String),

    /// The configuration file could not be read or parsed.
    #[error("Invalid config: {0}")]
    Config(String),
}
