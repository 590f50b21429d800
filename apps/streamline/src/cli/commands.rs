//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! Rendering is split from printing so tests can check the output text.

use super::Settings;
use crate::demos::{self, Demo};
use crate::error::AppError;
use serde_json::Value;
use streamline_core::{ExecMode, Roster};

// =============================================================================
// LIST COMMAND
// =============================================================================

/// List catalogue demos.
pub fn cmd_list(json_mode: bool) -> Result<(), AppError> {
    println!("{}", render_list(json_mode));
    Ok(())
}

/// Catalogue listing as text or JSON.
pub fn render_list(json_mode: bool) -> String {
    if json_mode {
        let entries: Vec<Value> = demos::catalogue()
            .iter()
            .map(|demo| serde_json::json!({ "name": demo.name, "summary": demo.summary }))
            .collect();
        return serde_json::to_string_pretty(&entries).unwrap_or_default();
    }

    let width = demos::catalogue()
        .iter()
        .map(|demo| demo.name.len())
        .max()
        .unwrap_or(0);
    let mut out = String::from("Streamline Demo Catalogue\n=========================\n");
    for demo in demos::catalogue() {
        out.push_str(&format!("  {:<width$}  {}\n", demo.name, demo.summary, width = width));
    }
    out
}

// =============================================================================
// RUN COMMANDS
// =============================================================================

/// Run one demo by name.
pub fn cmd_run(settings: &Settings, name: &str) -> Result<(), AppError> {
    let demo = demos::find(name).ok_or_else(|| AppError::UnknownDemo(name.to_string()))?;
    let roster = settings.roster()?;
    println!("{}", render_run(demo, &roster, settings.mode, settings.json_mode)?);
    Ok(())
}

/// Run every demo in catalogue order.
pub fn cmd_all(settings: &Settings) -> Result<(), AppError> {
    let roster = settings.roster()?;
    tracing::info!(demos = demos::catalogue().len(), mode = ?settings.mode, "Running catalogue");

    for demo in demos::catalogue() {
        println!("{}", render_run(demo, &roster, settings.mode, settings.json_mode)?);
    }
    Ok(())
}

/// Run `demo` and format its result.
pub fn render_run(
    demo: &Demo,
    roster: &Roster,
    mode: ExecMode,
    json_mode: bool,
) -> Result<String, AppError> {
    let result = demo.run(roster, mode)?;

    if json_mode {
        let output = serde_json::json!({
            "demo": demo.name,
            "mode": mode,
            "result": result,
        });
        return Ok(serde_json::to_string_pretty(&output).unwrap_or_default());
    }

    let mut out = format!("{} ({:?})\n", demo.name, mode);
    out.push_str(&"-".repeat(out.trim_end().len()));
    out.push('\n');
    match result {
        Value::Object(fields) => {
            for (key, value) in fields {
                out.push_str(&format!("{}: {}\n", key, value));
            }
        }
        other => out.push_str(&format!("{}\n", other)),
    }
    Ok(out)
}
