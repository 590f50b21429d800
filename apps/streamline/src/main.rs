//! # Streamline - Catalogue Runner
//!
//! The main binary for the Streamline pipeline library.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │             apps/streamline (THE BINARY)         │
//! │                                                  │
//! │  ┌─────────────┐  ┌────────────┐  ┌───────────┐  │
//! │  │    CLI      │  │   Config   │  │   Demos   │  │
//! │  │   (clap)    │  │   (toml)   │  │ (catalog) │  │
//! │  └──────┬──────┘  └─────┬──────┘  └─────┬─────┘  │
//! │         └───────────────┼───────────────┘        │
//! │                         ▼                        │
//! │                ┌─────────────────┐               │
//! │                │ streamline-core │               │
//! │                │  (THE LIBRARY)  │               │
//! │                └─────────────────┘               │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! streamline list
//! streamline run grouping --parallel
//! streamline all --roster team.toml --json-mode
//! ```

use clap::Parser;
use streamline::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing (STREAMLINE_LOG_FORMAT=json for machine-parseable output)
    let log_format = std::env::var("STREAMLINE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "streamline=debug,streamline_core=debug"
    } else {
        "streamline=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Streamline startup banner.
fn print_banner() {
    println!(
        r#"
  ┌─┐┌┬┐┬─┐┌─┐┌─┐┌┬┐┬  ┬┌┐┌┌─┐
  └─┐ │ ├┬┘├┤ ├─┤││││  ││││├┤
  └─┘ ┴ ┴└─└─┘┴ ┴┴ ┴┴─┘┴┘└┘└─┘

  Lazy Pipeline Catalogue v{}

  Lazy • Composable • Parallel
"#,
        env!("CARGO_PKG_VERSION")
    );
}
