//! CLI presenter for output formatting

use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::audio::LevelReading;

const METER_WIDTH: usize = 24;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.red} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Format a level meter line
    pub fn format_level_meter(&self, reading: LevelReading, elapsed: Duration) -> String {
        let level = reading.level.clamp(0.0, 1.0);
        let filled = (level * METER_WIDTH as f32).round() as usize;
        let empty = METER_WIDTH - filled.min(METER_WIDTH);

        let bar = "█".repeat(filled.min(METER_WIDTH));
        let bar = if level > 0.9 {
            bar.red()
        } else if level > 0.6 {
            bar.yellow()
        } else {
            bar.green()
        };

        format!(
            "[{}{}] {:>3}% {:>4}s",
            bar,
            "░".repeat(empty),
            (level * 100.0).round() as u32,
            elapsed.as_secs()
        )
    }

    /// Show the live meter while recording
    pub fn show_level_meter(&mut self) {
        self.start_spinner("Recording...");
    }

    /// Update the live meter
    pub fn update_level_meter(&self, reading: LevelReading, elapsed: Duration) {
        let meter = self.format_level_meter(reading, elapsed);
        self.update_spinner(&format!("Recording... {}", meter));
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}
