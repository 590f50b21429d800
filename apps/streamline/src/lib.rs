//! # Streamline - Catalogue Runner
//!
//! Library half of the `streamline` binary: CLI definitions, configuration
//! loading and the demo catalogue. `main.rs` only sets up logging and
//! dispatches to [`cli::execute`].

pub mod cli;
pub mod config;
pub mod demos;
pub mod error;

pub use config::StreamlineConfig;
pub use error::AppError;
