//! Terminal reporter with colored output, grouped by class

use crate::analysis::{Leak, LeakSubject};
use crate::report::colors::{ConfidenceIndicator, SeveritySymbol, StructureColors};
use colored::Colorize;
use std::collections::BTreeMap;

pub struct TerminalReporter {
    show_confidence: bool,
    show_paths: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self {
            show_confidence: true,
            show_paths: true,
        }
    }

    pub fn with_confidence(mut self, show: bool) -> Self {
        self.show_confidence = show;
        self
    }

    pub fn with_paths(mut self, show: bool) -> Self {
        self.show_paths = show;
        self
    }

    pub fn report(&self, leaks: &[Leak]) {
        if leaks.is_empty() {
            println!("{}", "No leaks found!".green().bold());
            return;
        }

        let mut by_class: BTreeMap<&str, Vec<&Leak>> = BTreeMap::new();
        for leak in leaks {
            by_class
                .entry(leak.subject.anchor_class())
                .or_default()
                .push(leak);
        }

        println!();
        println!(
            "Found {} potential leaks:",
            StructureColors::count(&leaks.len().to_string())
        );
        println!();

        if self.show_confidence {
            self.print_legend();
        }

        for (class, items) in by_class {
            println!("{}", StructureColors::class_name(class));
            for item in items {
                self.print_item(item);
            }
            println!();
        }
    }

    fn print_legend(&self) {
        println!("{}", "Confidence Legend:".dimmed());
        println!(
            "  {} {} {} {} {} {}",
            ConfidenceIndicator::high(),
            "never closed".dimmed(),
            ConfidenceIndicator::medium(),
            "closer unreachable".dimmed(),
            ConfidenceIndicator::low(),
            "heuristic".dimmed()
        );
        println!();
    }

    fn print_item(&self, item: &Leak) {
        let confidence = if self.show_confidence {
            format!("{} ", ConfidenceIndicator::for_level(&item.confidence))
        } else {
            String::new()
        };

        println!(
            "  {}{} [{}] {}",
            confidence,
            SeveritySymbol::colored(&item.severity),
            StructureColors::rule_code(item.issue.code()),
            item.message
        );

        match &item.subject {
            LeakSubject::Resource {
                opener_method,
                call_site,
                ..
            } => {
                let site = call_site
                    .map(|s| format!(" {}", StructureColors::location(&s.to_string())))
                    .unwrap_or_default();
                println!(
                    "    {} opened in '{}'{}",
                    "→".dimmed(),
                    StructureColors::symbol_name(&opener_method.short()),
                    site
                );
            }
            LeakSubject::StaticField { field_type, .. } => {
                println!(
                    "    {} static field '{}' : {}",
                    "→".dimmed(),
                    StructureColors::symbol_name(&item.subject.anchor_name()),
                    field_type.dimmed()
                );
            }
        }

        if self.show_paths {
            self.print_path(item);
        }
    }

    fn print_path(&self, item: &Leak) {
        if item.subject.anchor_method().is_none() {
            return;
        }
        match item.diagnostic_path.steps() {
            Some(steps) => {
                let rendered: Vec<String> = steps
                    .iter()
                    .map(|m| StructureColors::path_step(&m.short()).to_string())
                    .collect();
                println!("    {} {}", "path:".dimmed(), rendered.join(" → "));
            }
            None if item.diagnostic_path.status() == "not_found" => {
                println!("    {}", "path: not reachable from any entry point".dimmed());
            }
            None => {}
        }
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}
