//! Summary block printed after the terminal and compact reports

use crate::analysis::{AnalysisStats, Confidence, Leak, LeakIssue, Severity};
use crate::report::colors::{BoxChars, ChartChars, StructureColors};
use colored::Colorize;
use std::collections::BTreeMap;

pub struct SummaryReporter {
    bar_width: usize,
    stats: Option<AnalysisStats>,
}

impl SummaryReporter {
    pub fn new() -> Self {
        Self {
            bar_width: 20,
            stats: None,
        }
    }

    pub fn with_stats(mut self, stats: Option<AnalysisStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn report(&self, leaks: &[Leak]) {
        println!();
        println!("{}", "SearchLeaks Analysis Summary".cyan().bold());
        println!("{}", BoxChars::heavy_line(50));

        if let Some(stats) = &self.stats {
            self.print_program_stats(stats);
        }

        if leaks.is_empty() {
            println!("{}", "No leaks found!".green().bold());
            return;
        }

        println!();
        self.print_by_rule(leaks);
        println!();
        self.print_by_severity(leaks);
    }

    fn print_program_stats(&self, stats: &AnalysisStats) {
        let label_width = 20;
        let rows = [
            ("Classes:", stats.classes),
            ("Methods:", stats.methods),
            ("Call edges:", stats.edges),
            ("Pair definitions:", stats.pair_definitions),
            ("Pairs completed:", stats.pairs_completed),
            ("Exit points:", stats.exit_points),
        ];
        for (label, value) in rows {
            println!(
                "{:>width$}  {}",
                label.dimmed(),
                StructureColors::count(&Self::format_number(value)),
                width = label_width
            );
        }
        if stats.suppressed > 0 {
            println!(
                "{:>width$}  {}",
                "Suppressed:".dimmed(),
                StructureColors::count(&Self::format_number(stats.suppressed)),
                width = label_width
            );
        }
    }

    /// Format a number with thousands separators
    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();
        for (i, c) in s.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                result.push(',');
            }
            result.push(c);
        }
        result.chars().rev().collect()
    }

    fn print_by_rule(&self, leaks: &[Leak]) {
        println!("{}", "By Rule:".white().bold());

        let mut by_rule: BTreeMap<&'static str, (LeakIssue, usize)> = BTreeMap::new();
        for leak in leaks {
            by_rule.entry(leak.issue.code()).or_insert((leak.issue, 0)).1 += 1;
        }

        let total = leaks.len() as f64;
        for (code, (issue, count)) in by_rule {
            let pct = (count as f64 / total) * 100.0;
            let bar = ChartChars::bar(pct, self.bar_width);
            let colored_bar = match issue.default_severity() {
                Severity::Error => bar.red(),
                Severity::Warning => bar.yellow(),
                Severity::Info => bar.blue(),
            };
            println!(
                "  {} │{}│ {:>4} ({:>5.1}%)  {}",
                StructureColors::rule_code(code),
                colored_bar,
                count,
                pct,
                Self::rule_description(issue).dimmed()
            );
        }
    }

    fn print_by_severity(&self, leaks: &[Leak]) {
        let errors = leaks.iter().filter(|l| l.severity == Severity::Error).count();
        let warnings = leaks.iter().filter(|l| l.severity == Severity::Warning).count();
        let low = leaks
            .iter()
            .filter(|l| l.confidence == Confidence::Low)
            .count();

        println!(
            "  {} {}, {} {}",
            errors.to_string().red().bold(),
            "errors".red(),
            warnings.to_string().yellow().bold(),
            "warnings".yellow()
        );
        if low > 0 {
            println!("  {}", format!("{} low-confidence findings need review", low).dimmed());
        }
    }

    fn rule_description(issue: LeakIssue) -> &'static str {
        match issue {
            LeakIssue::NeverClosed => "Resource never closed",
            LeakIssue::CloserUnreachable => "Closer unreachable",
            LeakIssue::StaticContextField => "Static context field",
        }
    }
}

impl Default for SummaryReporter {
    fn default() -> Self {
        Self::new()
    }
}
