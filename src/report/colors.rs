//! Centralized color scheme for consistent output formatting

use crate::analysis::{Confidence, Severity};
use colored::{ColoredString, Colorize};

/// Confidence level indicators and colors
pub struct ConfidenceIndicator;

impl ConfidenceIndicator {
    /// No closer anywhere in the app
    pub fn high() -> ColoredString {
        "!".red().bold()
    }

    /// Closer exists but is not reachable
    pub fn medium() -> ColoredString {
        "?".yellow()
    }

    /// Heuristic, may be a false positive
    pub fn low() -> ColoredString {
        "~".dimmed().italic()
    }

    pub fn for_level(confidence: &Confidence) -> ColoredString {
        match confidence {
            Confidence::High => Self::high(),
            Confidence::Medium => Self::medium(),
            Confidence::Low => Self::low(),
        }
    }
}

/// Structural element colors
pub struct StructureColors;

impl StructureColors {
    /// Class header
    pub fn class_name(text: &str) -> ColoredString {
        text.cyan().bold()
    }

    /// Call site ids
    pub fn location(text: &str) -> ColoredString {
        text.dimmed()
    }

    /// Rule/issue code (e.g., RL001)
    pub fn rule_code(text: &str) -> ColoredString {
        text.magenta()
    }

    /// Method or field name
    pub fn symbol_name(text: &str) -> ColoredString {
        text.white().bold()
    }

    /// One step of a diagnostic path
    pub fn path_step(text: &str) -> ColoredString {
        text.blue()
    }

    /// Count/statistics numbers
    pub fn count(text: &str) -> ColoredString {
        text.white().bold()
    }
}

/// Severity symbols for compact display
pub struct SeveritySymbol;

impl SeveritySymbol {
    pub fn error() -> &'static str {
        "✖"
    }

    pub fn warning() -> &'static str {
        "⚠"
    }

    pub fn info() -> &'static str {
        "ℹ"
    }

    pub fn colored(severity: &Severity) -> ColoredString {
        match severity {
            Severity::Error => Self::error().red().bold(),
            Severity::Warning => Self::warning().yellow(),
            Severity::Info => Self::info().blue(),
        }
    }
}

/// Bar chart characters for the summary
pub struct ChartChars;

impl ChartChars {
    pub const FILLED: char = '█';
    pub const EMPTY: char = '░';

    pub fn bar(percentage: f64, width: usize) -> String {
        let filled = ((percentage / 100.0) * width as f64).round() as usize;
        let empty = width.saturating_sub(filled);
        format!(
            "{}{}",
            Self::FILLED.to_string().repeat(filled),
            Self::EMPTY.to_string().repeat(empty)
        )
    }
}

pub struct BoxChars;

impl BoxChars {
    pub fn heavy_line(width: usize) -> String {
        "━".repeat(width)
    }
}
