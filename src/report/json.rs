// JSON report for CI and tooling
//
// One object per finding. `diagnosticPath` is null unless a path was found;
// `pathStatus` tells "not found" apart from "not searched".

use crate::analysis::{
    AllocationPairDefinition, AnalysisStats, Confidence, Leak, LeakKind, LeakSubject, Severity,
};
use crate::error::LeakError;
use miette::Result;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

pub struct JsonReporter {
    output_path: Option<PathBuf>,
    stats: Option<AnalysisStats>,
}

#[derive(Serialize)]
struct ReportJson<'a> {
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<SummaryJson>,
    leaks: Vec<LeakJson<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryJson {
    total: usize,
    errors: usize,
    warnings: usize,
    classes: usize,
    methods: usize,
    edges: usize,
    pair_definitions: usize,
    pairs_completed: usize,
    exit_points: usize,
    suppressed: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LeakJson<'a> {
    kind: LeakKind,
    code: &'static str,
    severity: Severity,
    confidence: Confidence,
    message: &'a str,
    opener_method: Option<String>,
    call_site: Option<u32>,
    resource: Option<String>,
    pair: Option<&'a AllocationPairDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<FieldJson<'a>>,
    diagnostic_path: Option<Vec<String>>,
    path_status: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldJson<'a> {
    class: &'a str,
    name: &'a str,
    field_type: &'a str,
}

impl<'a> From<&'a Leak> for LeakJson<'a> {
    fn from(leak: &'a Leak) -> Self {
        let mut json = LeakJson {
            kind: leak.kind(),
            code: leak.issue.code(),
            severity: leak.severity,
            confidence: leak.confidence,
            message: &leak.message,
            opener_method: None,
            call_site: None,
            resource: None,
            pair: None,
            field: None,
            diagnostic_path: leak
                .diagnostic_path
                .steps()
                .map(|steps| steps.iter().map(|m| m.to_string()).collect()),
            path_status: leak.diagnostic_path.status(),
        };
        match &leak.subject {
            LeakSubject::Resource {
                opener_method,
                call_site,
                resource,
                pair,
            } => {
                json.opener_method = Some(opener_method.to_string());
                json.call_site = call_site.map(|s| s.0);
                json.resource = Some(resource.to_string());
                json.pair = pair.as_ref();
            }
            LeakSubject::StaticField {
                class,
                field,
                field_type,
            } => {
                json.field = Some(FieldJson {
                    class,
                    name: field,
                    field_type,
                });
            }
        }
        json
    }
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self {
            output_path,
            stats: None,
        }
    }

    pub fn with_stats(mut self, stats: Option<AnalysisStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn render(&self, leaks: &[Leak]) -> Result<String> {
        let summary = self.stats.map(|stats| SummaryJson {
            total: leaks.len(),
            errors: leaks.iter().filter(|l| l.severity == Severity::Error).count(),
            warnings: leaks.iter().filter(|l| l.severity == Severity::Warning).count(),
            classes: stats.classes,
            methods: stats.methods,
            edges: stats.edges,
            pair_definitions: stats.pair_definitions,
            pairs_completed: stats.pairs_completed,
            exit_points: stats.exit_points,
            suppressed: stats.suppressed,
        });
        let report = ReportJson {
            version: env!("CARGO_PKG_VERSION"),
            summary,
            leaks: leaks.iter().map(LeakJson::from).collect(),
        };
        serde_json::to_string_pretty(&report)
            .map_err(|e| miette::miette!("Failed to serialize report: {}", e))
    }

    pub fn report(&self, leaks: &[Leak]) -> Result<()> {
        let json = self.render(leaks)?;
        match &self.output_path {
            Some(path) => {
                std::fs::write(path, json).map_err(|e| LeakError::io(path, e))?;
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", json).map_err(LeakError::from)?;
            }
        }
        Ok(())
    }
}
