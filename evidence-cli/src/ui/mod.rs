//! Terminal output for evidence commands
//!
//! Status lines go to stdout except errors and warnings, which go to stderr
//! so piped output stays clean. Colour is dropped when `NO_COLOR` is set.

use std::time::Duration;

use colored::Colorize;
use evidence_lib::Fingerprint;
use indicatif::{ProgressBar, ProgressStyle};

pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Indented `key: value` line
pub fn key_value(key: &str, value: &str) {
    println!("  {}: {}", key.cyan(), value);
}

/// Size line, e.g. `Sealed: 4,384 bytes`
pub fn byte_count(key: &str, len: usize) {
    key_value(key, &format!("{} bytes", group_digits(len)));
}

/// Fingerprint line; the hex is printed unbroken so it can be copied.
pub fn fingerprint(fingerprint: &Fingerprint) {
    key_value("Fingerprint", &fingerprint.to_hex().bold().to_string());
}

/// Spinner drawn on stderr, hidden when stderr is not a terminal
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn confirm(prompt: &str, default: bool) -> anyhow::Result<bool> {
    Ok(dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

fn group_digits(n: usize) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(10_000_000), "10,000,000");
    }
}
