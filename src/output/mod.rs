//! Styled terminal status output for tf2d2
//!
//! Everything here goes to stderr: stdout is reserved for the diagram
//! script in dry-run mode.

use owo_colors::{OwoColorize, Rgb};

const MINT: Rgb = Rgb(152, 225, 152);
const CORAL: Rgb = Rgb(255, 160, 160);
const LAVENDER: Rgb = Rgb(181, 174, 254);
const MUTED: Rgb = Rgb(160, 160, 160);

const RULE_WIDTH: usize = 50;
/// Key column width, so "Resources:", "Connections:" and the paths line up
const KEY_WIDTH: usize = 13;

pub fn success(message: &str) {
    eprintln!("{}", marked("✓", MINT, message));
}

pub fn error(message: &str) {
    eprintln!("{}", marked("✗", CORAL, message));
}

/// Section title followed by a muted rule
pub fn section(title: &str) {
    eprintln!("\n{}", title.color(LAVENDER).bold());
    eprintln!("{}", "─".repeat(RULE_WIDTH).color(MUTED));
}

pub fn key_value(key: &str, value: &str) {
    eprintln!("{}", pair(key, value));
}

pub fn dimmed(message: &str) {
    eprintln!("{}", message.color(MUTED));
}

fn marked(marker: &str, color: Rgb, message: &str) -> String {
    format!("{} {}", marker.color(color).bold(), message.bright_white())
}

fn pair(key: &str, value: &str) -> String {
    let key = format!("{:<width$}", format!("{}:", key), width = KEY_WIDTH);
    format!("  {}{}", key.color(MUTED), value.bright_white())
}
