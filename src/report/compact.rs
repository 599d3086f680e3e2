//! Compact terminal reporter - one line per finding

use crate::analysis::{Leak, Severity};
use crate::report::colors::{BoxChars, ConfidenceIndicator, SeveritySymbol, StructureColors};
use colored::Colorize;

pub struct CompactReporter {
    show_confidence: bool,
    /// Maximum width for the anchor column (truncated from the left)
    max_anchor_width: usize,
}

impl CompactReporter {
    pub fn new() -> Self {
        Self {
            show_confidence: true,
            max_anchor_width: 48,
        }
    }

    pub fn with_confidence(mut self, show: bool) -> Self {
        self.show_confidence = show;
        self
    }

    fn format_anchor(&self, anchor: &str) -> String {
        let chars: Vec<char> = anchor.chars().collect();
        if chars.len() > self.max_anchor_width {
            let keep = self.max_anchor_width.saturating_sub(3);
            let tail: String = chars[chars.len() - keep..].iter().collect();
            format!("...{}", tail)
        } else {
            anchor.to_string()
        }
    }

    pub fn report(&self, leaks: &[Leak]) {
        if leaks.is_empty() {
            println!("{}", "No leaks found!".green().bold());
            return;
        }

        for leak in leaks {
            self.print_item(leak);
        }
        println!();
        self.print_summary(leaks);
    }

    fn print_item(&self, item: &Leak) {
        let confidence = if self.show_confidence {
            format!("{} ", ConfidenceIndicator::for_level(&item.confidence))
        } else {
            String::new()
        };
        let anchor = format!(
            "{}.{}",
            item.subject.anchor_class(),
            match item.subject.anchor_method() {
                Some(method) => method.name().to_string(),
                None => item
                    .subject
                    .anchor_name()
                    .rsplit('.')
                    .next()
                    .unwrap_or_default()
                    .to_string(),
            }
        );

        println!(
            "  {}{}  {}  {}  {}",
            confidence,
            SeveritySymbol::colored(&item.severity),
            StructureColors::rule_code(item.issue.code()),
            StructureColors::symbol_name(&self.format_anchor(&anchor)),
            item.message
        );
    }

    fn print_summary(&self, leaks: &[Leak]) {
        let errors = leaks.iter().filter(|l| l.severity == Severity::Error).count();
        let warnings = leaks.iter().filter(|l| l.severity == Severity::Warning).count();

        println!("{}", BoxChars::heavy_line(50).dimmed());

        let mut parts = Vec::new();
        if errors > 0 {
            parts.push(format!("{} {}", errors, "errors".red()));
        }
        if warnings > 0 {
            parts.push(format!("{} {}", warnings, "warnings".yellow()));
        }

        println!(
            "  {} {} ({})",
            StructureColors::count(&leaks.len().to_string()),
            "leaks".bold(),
            parts.join(", ")
        );
    }
}

impl Default for CompactReporter {
    fn default() -> Self {
        Self::new()
    }
}
