pub mod cat;
pub mod completions;
pub mod resolve;
pub mod tmpl;
pub mod version;

use indicatif::{ProgressBar, ProgressStyle};
use kyml_core::Source;
use std::io::{self, Read, Write};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_INPUT_ERROR: u8 = 2;
pub const EXIT_RESOLVE_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn sources(files: &[String]) -> Vec<Source> {
    files.iter().map(|f| Source::parse(f)).collect()
}

pub fn read_stdin() -> Result<String, String> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| format!("cannot read <stdin>: {e}"))?;
    Ok(input)
}

/// Write manifests to stdout in one go so a failure never leaves partial output.
pub fn emit(text: &str) -> Result<(), String> {
    let mut out = io::stdout().lock();
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|e| format!("failed to write output: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn plain_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner())
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(plain_style());
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(plain_style());
    pb.finish_with_message(format!("✗ {msg}"));
}

/// Color unified diff lines for terminal output.
pub fn colorize_diff(diff: &str) -> String {
    use console::Style;
    let mut out = String::with_capacity(diff.len());
    for line in diff.split_inclusive('\n') {
        let styled = if line.starts_with("---") || line.starts_with("+++") {
            Style::new().bold().apply_to(line).to_string()
        } else if line.starts_with("@@") {
            Style::new().cyan().apply_to(line).to_string()
        } else if line.starts_with('-') {
            Style::new().red().apply_to(line).to_string()
        } else if line.starts_with('+') {
            Style::new().green().apply_to(line).to_string()
        } else {
            line.to_owned()
        };
        out.push_str(&styled);
    }
    out
}
