mod colors;
mod compact;
mod json;
mod summary;
mod terminal;

pub use compact::CompactReporter;
pub use json::JsonReporter;
pub use summary::SummaryReporter;
pub use terminal::TerminalReporter;

use crate::analysis::{AnalysisStats, Leak};
use miette::Result;
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Colored output grouped by class
    #[default]
    Terminal,
    /// One line per finding
    Compact,
    /// Machine-readable JSON
    Json,
}

/// Options for report generation
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Output file path (JSON only)
    pub output_path: Option<PathBuf>,
    pub show_confidence: bool,
    /// Print diagnostic paths under each finding
    pub show_paths: bool,
    /// Analysis counters for the summary
    pub stats: Option<AnalysisStats>,
}

impl ReportOptions {
    pub fn new() -> Self {
        Self {
            output_path: None,
            show_confidence: true,
            show_paths: true,
            stats: None,
        }
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Reporter for leak analysis results
pub struct Reporter {
    format: ReportFormat,
    options: ReportOptions,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            options: ReportOptions {
                output_path,
                ..ReportOptions::new()
            },
        }
    }

    pub fn with_options(format: ReportFormat, options: ReportOptions) -> Self {
        Self { format, options }
    }

    pub fn report(&self, leaks: &[Leak]) -> Result<()> {
        match self.format {
            ReportFormat::Terminal => {
                TerminalReporter::new()
                    .with_confidence(self.options.show_confidence)
                    .with_paths(self.options.show_paths)
                    .report(leaks);
                self.print_final_summary(leaks);
                Ok(())
            }
            ReportFormat::Compact => {
                CompactReporter::new()
                    .with_confidence(self.options.show_confidence)
                    .report(leaks);
                Ok(())
            }
            ReportFormat::Json => JsonReporter::new(self.options.output_path.clone())
                .with_stats(self.options.stats)
                .report(leaks),
        }
    }

    fn print_final_summary(&self, leaks: &[Leak]) {
        SummaryReporter::new()
            .with_stats(self.options.stats)
            .report(leaks);
    }
}
