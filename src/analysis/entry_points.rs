// Entry-point and exit-point detection
//
// Android apps have no main(): components declared in the manifest (or
// subclasses of the platform component bases) are entered by the framework
// through lifecycle callbacks. Terminal callbacks of those components are the
// exit points used by the reachability analysis.

use crate::config::Config;
use crate::graph::{CallGraph, ClassHierarchy};
use crate::program::{Manifest, MethodId, Program};
use petgraph::graph::NodeIndex;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

pub struct EntryPointDetector {
    exit_methods: HashSet<String>,
    lifecycle_methods: HashSet<String>,
    component_bases: Vec<String>,
    infer_components: bool,
}

impl EntryPointDetector {
    pub fn new(config: &Config) -> Self {
        Self {
            exit_methods: config.exit_methods.iter().cloned().collect(),
            lifecycle_methods: config.lifecycle_methods.iter().cloned().collect(),
            component_bases: config.component_bases.clone(),
            infer_components: config.infer_components,
        }
    }

    /// Classes the framework may enter: flagged by the model, declared in the
    /// manifest, or (optionally) inheriting from a component base
    pub fn entry_point_classes(
        &self,
        program: &Program,
        hierarchy: &ClassHierarchy<'_>,
        manifest: Option<&Manifest>,
    ) -> BTreeSet<String> {
        let mut classes: BTreeSet<String> = program
            .classes
            .iter()
            .filter(|c| c.entry_point)
            .map(|c| c.name.clone())
            .collect();
        let flagged = classes.len();

        if let Some(manifest) = manifest {
            classes.extend(manifest.component_classes());
        }
        let declared = classes.len() - flagged;

        if self.infer_components {
            for class in hierarchy.classes() {
                // the platform bases themselves are never app components
                if self.component_bases.iter().any(|b| *b == class.name) {
                    continue;
                }
                let is_component = hierarchy.walk_chain(&class.name, |name| {
                    self.component_bases.iter().any(|b| b == name)
                });
                if is_component {
                    classes.insert(class.name.clone());
                }
            }
        }

        info!(
            "Entry-point classes: {} total ({} flagged, {} from manifest)",
            classes.len(),
            flagged,
            declared
        );
        classes
    }

    pub fn is_exit_point(&self, method: &MethodId, entry_classes: &BTreeSet<String>) -> bool {
        entry_classes.contains(method.class()) && self.exit_methods.contains(method.name())
    }

    /// Exit points found among the endpoints of all call-graph edges
    pub fn exit_points(
        &self,
        graph: &CallGraph,
        entry_classes: &BTreeSet<String>,
    ) -> BTreeSet<MethodId> {
        let mut exits = BTreeSet::new();
        for edge in graph.edges() {
            for endpoint in [&edge.caller, &edge.callee] {
                if self.is_exit_point(endpoint, entry_classes) {
                    exits.insert(endpoint.clone());
                }
            }
        }
        debug!("Found {} exit points", exits.len());
        exits
    }

    /// Roots for the path finder: the model's declared entry methods, or the
    /// lifecycle callbacks of entry-point classes when none are declared
    pub fn entry_methods(
        &self,
        program: &Program,
        graph: &CallGraph,
        entry_classes: &BTreeSet<String>,
    ) -> Vec<NodeIndex> {
        if !program.entry_points.is_empty() {
            return program
                .entry_points
                .iter()
                .filter_map(|m| graph.node_index(m))
                .collect();
        }

        let mut roots: Vec<&MethodId> = graph
            .methods()
            .filter(|m| {
                entry_classes.contains(m.class()) && self.lifecycle_methods.contains(m.name())
            })
            .collect();
        roots.sort();
        roots
            .into_iter()
            .filter_map(|m| graph.node_index(m))
            .collect()
    }
}
