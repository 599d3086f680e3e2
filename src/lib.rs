//! SearchLeaks - static resource and context leak detection for Android apps
//!
//! The analysis works on a method-level call graph exported from the app
//! (see [`program::Program`]) and never runs the app.
//!
//! # Architecture
//!
//! The analysis pipeline consists of:
//! 1. **Pair Registry** - opener/closer method pairs per class
//! 2. **Allocation Tracker** - one scan over the call edges pairing opener
//!    call sites with closer call sites
//! 3. **Entry/Exit Detection** - Android components and their terminal
//!    lifecycle callbacks
//! 4. **Leak Reachability** - per opener call site, is a closer reachable
//!    before the component exits
//! 5. **Context Classification** - classes that can retain a `Context`,
//!    used to flag static fields
//! 6. **Reporting** - terminal, compact or JSON output

pub mod analysis;
pub mod config;
pub mod error;
pub mod graph;
pub mod program;
pub mod report;

pub use analysis::{
    AllocationTracker, AnalysisOutcome, ContextContainerClassifier, ContextContainerSet, Leak,
    LeakEngine, LeakReachabilityAnalyzer, PairRegistry, PathFinder,
};
pub use config::Config;
pub use error::{LeakError, LeakResult};
pub use graph::{CallGraph, ClassHierarchy, SyntheticOverlay};
pub use program::{CallEdge, ClassInfo, Manifest, MethodId, Program};
pub use report::{ReportFormat, Reporter};
