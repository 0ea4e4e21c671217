//! Terminal output for CLI handlers.
//!
//! Human output uses colored symbols and `tabled` tables. With `--json`
//! every handler prints one JSON document on stdout instead; `--quiet`
//! suppresses everything except errors and warnings.

use std::fmt::Display;
use std::sync::{OnceLock, RwLock};

use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Runtime output configuration shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Emit machine-readable JSON output instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
    /// Verbosity level (0 = normal, 1+ = increasingly verbose).
    pub verbose: u8,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            json,
            quiet,
            verbose,
        }
    }
}

static OUTPUT_CONFIG: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn config_cell() -> &'static RwLock<OutputConfig> {
    OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()))
}

fn read_config() -> OutputConfig {
    match config_cell().read() {
        Ok(config) => *config,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

/// Apply output settings from global CLI flags.
pub fn configure(config: OutputConfig) {
    match config_cell().write() {
        Ok(mut current) => *current = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// Human lines are printed only outside JSON and quiet modes.
fn human() -> bool {
    let config = read_config();
    !config.json && !config.quiet
}

#[must_use]
pub fn is_json() -> bool {
    read_config().json
}

/// Print the result document of `command` in JSON mode.
pub fn json_result(command: &str, payload: impl Serialize) {
    let payload = serde_json::to_value(payload).unwrap_or_else(|e| json!({ "error": e.to_string() }));
    println!("{}", json!({ "command": command, "result": payload }));
}

/// Print a section header.
pub fn section(title: &str) {
    if !human() {
        return;
    }
    println!();
    println!("{}", title.bold());
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    if !human() {
        return;
    }
    println!("  {:<14} {}", label.dimmed(), value);
}

/// Print a success line.
pub fn success(message: &str) {
    if !human() {
        return;
    }
    println!("  {} {}", "✓".green(), message);
}

/// Print a warning line.
pub fn warning(message: &str) {
    if is_json() {
        eprintln!("{}", json!({ "type": "warning", "message": message }));
        return;
    }
    eprintln!("  {} {}", "⚠".yellow(), message);
}

/// Print an error line.
pub fn error(message: &str) {
    if is_json() {
        eprintln!("{}", json!({ "type": "error", "message": message }));
        return;
    }
    eprintln!("  {} {}", "×".red(), message);
}

/// Print a dimmed note.
pub fn note(message: &str) {
    if !human() {
        return;
    }
    println!("  {}", message.dimmed());
}

/// Render rows as a table, or a note when there are none.
pub fn table<T: Tabled>(rows: Vec<T>, empty: &str) {
    if !human() {
        return;
    }
    if rows.is_empty() {
        note(empty);
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    for line in table.to_string().lines() {
        println!("  {line}");
    }
}

/// Format a signed amount in green or red.
pub fn signed(value: i64) -> String {
    if is_json() {
        return value.to_string();
    }
    if value < 0 {
        format!("{}", value.red())
    } else {
        format!("{}", format!("+{value}").green())
    }
}

/// Format a highlighted value in cyan.
pub fn highlight(value: impl Display) -> String {
    let value = value.to_string();
    if is_json() {
        return value;
    }
    format!("{}", value.cyan())
}

/// Format a probability as a percentage.
pub fn percent(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}
