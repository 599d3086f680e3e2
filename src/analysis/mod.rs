pub mod context;
mod engine;
mod entry_points;
pub mod pairs;
mod path_finder;
mod reachability;
mod static_fields;
pub mod tracker;

pub use context::{ClassifierStats, ContextContainerClassifier, ContextContainerSet};
pub use engine::{AnalysisOutcome, AnalysisStats, LeakEngine};
pub use entry_points::EntryPointDetector;
pub use pairs::{AllocType, AllocationPairDefinition, PairKey, PairRegistry, RegistryWarning};
pub use path_finder::PathFinder;
pub use reachability::LeakReachabilityAnalyzer;
pub use static_fields::StaticContextFieldDetector;
pub use tracker::{AllocationPairState, AllocationTracker, PairStatus, PendingOpener};

use crate::program::{CallSiteId, MethodId};
use serde::Serialize;

/// Confidence level of a leak finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Heuristic candidate, needs manual review
    Low,
    /// A closer exists but the analysis found no path to it
    Medium,
    /// No closer exists anywhere in the program
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity levels for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Broad class of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeakKind {
    ResourceLeak,
    ContextLeak,
}

/// Specific issue behind a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeakIssue {
    /// Opener with no matching closer anywhere in the program
    NeverClosed,

    /// A closer exists, but none is reachable from this opener call site
    CloserUnreachable,

    /// Static field typed as a context container or UI class
    StaticContextField,
}

impl LeakIssue {
    pub fn kind(&self) -> LeakKind {
        match self {
            LeakIssue::NeverClosed | LeakIssue::CloserUnreachable => LeakKind::ResourceLeak,
            LeakIssue::StaticContextField => LeakKind::ContextLeak,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            LeakIssue::NeverClosed => "RL001",
            LeakIssue::CloserUnreachable => "RL002",
            LeakIssue::StaticContextField => "CL001",
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            LeakIssue::NeverClosed => Severity::Error,
            LeakIssue::CloserUnreachable => Severity::Warning,
            LeakIssue::StaticContextField => Severity::Warning,
        }
    }

    pub fn default_confidence(&self) -> Confidence {
        match self {
            LeakIssue::NeverClosed => Confidence::High,
            LeakIssue::CloserUnreachable => Confidence::Medium,
            LeakIssue::StaticContextField => Confidence::Low,
        }
    }

    pub fn default_message(&self, subject: &LeakSubject) -> String {
        match (self, subject) {
            (LeakIssue::NeverClosed, LeakSubject::Resource { resource, .. }) => format!(
                "Resource opened with '{}' is never closed anywhere in the app",
                resource.short()
            ),
            (
                LeakIssue::CloserUnreachable,
                LeakSubject::Resource {
                    resource, pair, ..
                },
            ) => match pair {
                Some(pair) => format!(
                    "Resource opened with '{}' may never be closed: no call to '{}' is reachable before exit",
                    resource.short(),
                    pair.closer
                ),
                None => format!("Resource opened with '{}' may never be closed", resource.short()),
            },
            (LeakIssue::StaticContextField, LeakSubject::StaticField { field, field_type, .. }) => {
                format!(
                    "Static field '{}' of type '{}' can retain a Context past its lifecycle",
                    field, field_type
                )
            }
            (_, subject) => format!("Potential leak at {}", subject.anchor_name()),
        }
    }
}

/// What a finding points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeakSubject {
    /// Opener call site inside `opener_method`
    Resource {
        opener_method: MethodId,
        call_site: Option<CallSiteId>,
        /// The opener itself (e.g. `Camera.open`)
        resource: MethodId,
        /// Definition that was judged; absent for never-closed openers
        pair: Option<AllocationPairDefinition>,
    },
    /// Static field declaration
    StaticField {
        class: String,
        field: String,
        field_type: String,
    },
}

impl LeakSubject {
    /// Class the finding is anchored in (used for grouping and exclusion)
    pub fn anchor_class(&self) -> &str {
        match self {
            LeakSubject::Resource { opener_method, .. } => opener_method.class(),
            LeakSubject::StaticField { class, .. } => class,
        }
    }

    pub fn anchor_name(&self) -> String {
        match self {
            LeakSubject::Resource { opener_method, .. } => opener_method.short(),
            LeakSubject::StaticField { class, field, .. } => {
                let simple = class.rsplit('.').next().unwrap_or(class);
                format!("{}.{}", simple, field)
            }
        }
    }

    /// Method whose entry-point path is shown with the finding
    pub fn anchor_method(&self) -> Option<&MethodId> {
        match self {
            LeakSubject::Resource { opener_method, .. } => Some(opener_method),
            LeakSubject::StaticField { .. } => None,
        }
    }
}

/// Diagnostic path from an entry point to the anchor method
///
/// "Not found" and "not searched" are reported differently.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DiagnosticPath {
    #[default]
    NotSearched,
    NotFound,
    Found(Vec<MethodId>),
}

impl DiagnosticPath {
    pub fn status(&self) -> &'static str {
        match self {
            DiagnosticPath::NotSearched => "not_searched",
            DiagnosticPath::NotFound => "not_found",
            DiagnosticPath::Found(_) => "found",
        }
    }

    pub fn steps(&self) -> Option<&[MethodId]> {
        match self {
            DiagnosticPath::Found(path) => Some(path),
            _ => None,
        }
    }
}

/// A single leak finding
#[derive(Debug, Clone)]
pub struct Leak {
    pub issue: LeakIssue,
    pub subject: LeakSubject,
    pub severity: Severity,
    pub confidence: Confidence,
    pub message: String,
    pub diagnostic_path: DiagnosticPath,
}

impl Leak {
    pub fn new(issue: LeakIssue, subject: LeakSubject) -> Self {
        let message = issue.default_message(&subject);
        Self {
            issue,
            subject,
            severity: issue.default_severity(),
            confidence: issue.default_confidence(),
            message,
            diagnostic_path: DiagnosticPath::NotSearched,
        }
    }

    pub fn with_path(mut self, path: DiagnosticPath) -> Self {
        self.diagnostic_path = path;
        self
    }

    pub fn kind(&self) -> LeakKind {
        self.issue.kind()
    }

    /// Sort key giving reproducible output across runs
    pub fn sort_key(&self) -> (String, String, &'static str) {
        let detail = match &self.subject {
            LeakSubject::Resource {
                opener_method,
                resource,
                pair,
                ..
            } => format!(
                "{}|{}|{}",
                opener_method,
                resource,
                pair.as_ref().map(|p| p.to_string()).unwrap_or_default()
            ),
            LeakSubject::StaticField { field, .. } => field.clone(),
        };
        (self.subject.anchor_class().to_string(), detail, self.issue.code())
    }
}
