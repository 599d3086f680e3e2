// Leak engine
//
// Runs the whole pipeline over a loaded program: call graph, entry and exit
// points, allocation tracking, reachability, optional static context fields,
// then decorates each finding with an entry-point path.

use super::context::{ContextContainerClassifier, ContextContainerSet};
use super::entry_points::EntryPointDetector;
use super::pairs::PairRegistry;
use super::path_finder::PathFinder;
use super::reachability::LeakReachabilityAnalyzer;
use super::static_fields::StaticContextFieldDetector;
use super::tracker::AllocationTracker;
use super::{DiagnosticPath, Leak};
use crate::config::Config;
use crate::error::LeakResult;
use crate::graph::{CallGraph, ClassHierarchy};
use crate::program::{Manifest, Program};
use regex::Regex;
use tracing::{debug, info};

/// Counters shown in the report footer and in verbose logs
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisStats {
    pub classes: usize,
    pub methods: usize,
    pub edges: usize,
    pub pair_definitions: usize,
    pub pairs_completed: usize,
    pub pending_openers: usize,
    pub entry_classes: usize,
    pub exit_points: usize,
    pub suppressed: usize,
}

#[derive(Debug)]
pub struct AnalysisOutcome {
    pub leaks: Vec<Leak>,
    pub stats: AnalysisStats,
    pub context_containers: Option<ContextContainerSet>,
}

pub struct LeakEngine<'c> {
    config: &'c Config,
    exclusions: Vec<Regex>,
    classify_contexts: bool,
}

impl<'c> LeakEngine<'c> {
    pub fn new(config: &'c Config) -> LeakResult<Self> {
        Ok(Self {
            config,
            exclusions: config.compile_exclusions()?,
            classify_contexts: config.context_leaks,
        })
    }

    /// Compute the context container set even when static field detection
    /// is off
    pub fn with_context_classification(mut self, enabled: bool) -> Self {
        self.classify_contexts = self.classify_contexts || enabled;
        self
    }

    /// Registry from the builtin catalog, pair files and inline pairs, in
    /// that order
    pub fn load_registry(&self) -> LeakResult<PairRegistry> {
        let mut builder = PairRegistry::builder();
        if self.config.builtin_pairs {
            builder.add_builtin()?;
        }
        for path in &self.config.pair_files {
            builder.add_file(path)?;
        }
        for (idx, definition) in self.config.pairs.iter().enumerate() {
            builder.add(definition.clone(), "config pairs", idx + 1)?;
        }
        info!("Loaded {} pair definitions", builder.len());
        builder.build()
    }

    pub fn analyze(
        &self,
        program: &Program,
        registry: &PairRegistry,
        manifest: Option<&Manifest>,
    ) -> AnalysisOutcome {
        let graph = CallGraph::from_edges(&program.edges);
        let hierarchy = ClassHierarchy::new(program);
        info!(
            "Call graph: {} methods, {} edges, {} classes",
            graph.method_count(),
            graph.edge_count(),
            hierarchy.len()
        );

        let entry_detector = EntryPointDetector::new(self.config);
        let entry_classes = entry_detector.entry_point_classes(program, &hierarchy, manifest);
        let exits = entry_detector.exit_points(&graph, &entry_classes);

        let tracker = AllocationTracker::scan(registry, graph.edges());
        let mut leaks = LeakReachabilityAnalyzer::new(&graph, &exits)
            .with_parallel(self.config.parallel)
            .analyze(&tracker);

        let context_containers = if self.classify_contexts {
            let set = ContextContainerClassifier::new(&hierarchy, self.config.context_class.as_str())
                .classify();
            if self.config.context_leaks {
                let detector = StaticContextFieldDetector::new(&set, &self.config.ui_classes);
                leaks.extend(detector.detect(&hierarchy));
            }
            Some(set)
        } else {
            None
        };

        let before = leaks.len();
        leaks.retain(|leak| !self.is_excluded(leak.subject.anchor_class()));
        let suppressed = before - leaks.len();
        if suppressed > 0 {
            debug!("Suppressed {} findings by exclusion pattern", suppressed);
        }

        if self.config.find_paths {
            let roots = entry_detector.entry_methods(program, &graph, &entry_classes);
            let finder = PathFinder::new(&graph, roots);
            debug!("Path finder rooted at {} methods", finder.root_count());
            for leak in &mut leaks {
                if let Some(method) = leak.subject.anchor_method() {
                    leak.diagnostic_path = finder.diagnose(method);
                }
            }
        } else {
            for leak in &mut leaks {
                leak.diagnostic_path = DiagnosticPath::NotSearched;
            }
        }

        leaks.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let stats = AnalysisStats {
            classes: hierarchy.len(),
            methods: graph.method_count(),
            edges: graph.edge_count(),
            pair_definitions: registry.len(),
            pairs_completed: tracker.completed().count(),
            pending_openers: tracker.pending().count(),
            entry_classes: entry_classes.len(),
            exit_points: exits.len(),
            suppressed,
        };

        AnalysisOutcome {
            leaks,
            stats,
            context_containers,
        }
    }

    fn is_excluded(&self, class: &str) -> bool {
        self.exclusions.iter().any(|re| re.is_match(class))
    }
}
