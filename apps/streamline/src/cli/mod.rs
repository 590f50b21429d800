//! # Streamline CLI Module
//!
//! This module implements the CLI interface for Streamline.
//!
//! ## Available Commands
//!
//! - `list` - List catalogue demos
//! - `run <demo>` - Run one demo over the roster
//! - `all` - Run every demo

mod commands;

use crate::config::StreamlineConfig;
use crate::error::AppError;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use streamline_core::{ExecMode, Roster};

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Streamline - lazy pipeline catalogue
///
/// Runs named sequence pipelines over an employee roster, sequentially or
/// on the rayon worker pool.
#[derive(Parser, Debug)]
#[command(name = "streamline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Roster fixture (.toml or .json); defaults to the sample roster
    #[arg(short = 'r', long, global = true)]
    pub roster: Option<PathBuf>,

    /// Evaluate pipelines in parallel mode
    #[arg(short = 'p', long, global = true, conflicts_with = "sequential")]
    pub parallel: bool,

    /// Evaluate pipelines sequentially, even if the config file enables parallel mode
    #[arg(short = 's', long, global = true)]
    pub sequential: bool,

    /// Configuration file (defaults to ./streamline.toml when present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List catalogue demos
    List,

    /// Run one demo
    Run {
        /// Demo name (see `list`)
        demo: String,
    },

    /// Run every demo in catalogue order
    All,
}

// =============================================================================
// RUN SETTINGS
// =============================================================================

/// Effective settings after merging the config file with CLI flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub mode: ExecMode,
    pub json_mode: bool,
    pub roster_path: Option<PathBuf>,
}

impl Settings {
    /// Merge `config` with the flags in `cli`. Flags win.
    ///
    /// `--sequential` overrides `parallel = true` from the config file.
    pub fn merge(config: &StreamlineConfig, cli: &Cli) -> Self {
        let parallel = !cli.sequential && (cli.parallel || config.parallel);
        Self {
            mode: if parallel {
                ExecMode::Parallel
            } else {
                ExecMode::Sequential
            },
            json_mode: cli.json_mode || config.json_mode,
            roster_path: cli.roster.clone().or_else(|| config.roster.clone()),
        }
    }

    /// Load the configured roster, or the sample roster.
    pub fn roster(&self) -> Result<Roster, AppError> {
        match &self.roster_path {
            Some(path) => {
                let roster = Roster::load(path)?;
                tracing::info!(path = %path.display(), employees = roster.len(), "Loaded roster");
                Ok(roster)
            }
            None => Ok(Roster::sample()),
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), AppError> {
    let config = StreamlineConfig::resolve(cli.config.as_deref(), Path::new("."))?;
    config.configure_thread_pool();
    let settings = Settings::merge(&config, &cli);

    match cli.command {
        Some(Commands::List) | None => cmd_list(settings.json_mode),
        Some(Commands::Run { demo }) => cmd_run(&settings, &demo),
        Some(Commands::All) => cmd_all(&settings),
    }
}
