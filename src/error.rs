//! Error types for SearchLeaks
//!
//! Only configuration and input problems are errors. Leak findings are
//! advisory and never abort a run.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type LeakResult<T> = Result<T, LeakError>;

#[derive(Debug, Error, Diagnostic)]
pub enum LeakError {
    /// A pair definition record could not be parsed
    #[error("{origin}:{line}: malformed pair definition '{record}' ({reason})")]
    #[diagnostic(
        code(searchleaks::pairs::malformed),
        help("records have the form `className ## openerName ## closerName`")
    )]
    MalformedPair {
        origin: String,
        line: usize,
        record: String,
        reason: String,
    },

    /// The same (class, opener, closer) triple was defined twice
    #[error("duplicate pair definition '{record}' (first defined at {first}, again at {second})")]
    #[diagnostic(
        code(searchleaks::pairs::duplicate),
        help("remove one of the two records; duplicates are never merged")
    )]
    DuplicatePair {
        record: String,
        first: String,
        second: String,
    },

    #[error("invalid method signature '{0}'")]
    #[diagnostic(
        code(searchleaks::program::signature),
        help("use `<com.example.Class: void name(int)>` or the shorthand `com.example.Class.name`")
    )]
    InvalidMethodSignature(String),

    #[error("failed to read {path}: {source}")]
    #[diagnostic(code(searchleaks::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report: {0}")]
    #[diagnostic(code(searchleaks::report))]
    Report(#[from] std::io::Error),

    #[error("failed to parse program model {path}: {source}")]
    #[diagnostic(code(searchleaks::program::parse))]
    ProgramParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(code(searchleaks::config::parse))]
    ConfigParse { path: PathBuf, message: String },

    #[error("invalid exclude pattern '{pattern}': {source}")]
    #[diagnostic(code(searchleaks::config::pattern))]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to parse manifest {path}: {message}")]
    #[diagnostic(code(searchleaks::manifest))]
    Manifest { path: PathBuf, message: String },
}

impl LeakError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn manifest(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Manifest {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn malformed(
        origin: impl Into<String>,
        line: usize,
        record: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedPair {
            origin: origin.into(),
            line,
            record: record.into(),
            reason: reason.into(),
        }
    }
}
