//! Terminal and JSON output

use crate::core::RequestStatus;
use crate::error::Result;
use colored::{ColoredString, Colorize};
use serde::Serialize;

/// Prints command results either for humans or as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormatter {
    json: bool,
}

impl OutputFormatter {
    #[must_use]
    pub fn new(json: bool, no_color: bool) -> Self {
        if no_color || json {
            colored::control::set_override(false);
        }
        Self { json }
    }

    #[must_use]
    pub const fn is_json(&self) -> bool {
        self.json
    }

    pub fn success(&self, message: &str) {
        if !self.json {
            println!("{} {}", "✓".green().bold(), message);
        }
    }

    /// Errors always go to stderr, JSON mode included
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }

    pub fn info(&self, message: &str) {
        if !self.json {
            println!("{message}");
        }
    }

    pub fn warning(&self, message: &str) {
        if !self.json {
            println!("{} {}", "⚠".yellow().bold(), message);
        }
    }

    /// Print a value as pretty JSON on stdout
    pub fn json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Request status colored by urgency
    #[must_use]
    pub fn status(&self, status: RequestStatus) -> ColoredString {
        match status {
            RequestStatus::Pending => status.as_str().yellow().bold(),
            RequestStatus::Accepted => status.as_str().cyan(),
            RequestStatus::Completed => status.as_str().green(),
        }
    }
}
