// Leak reachability analysis
//
// For every completed pair, each opener caller gets synthetic edges to every
// exit point, then must reach at least one closer caller. The synthetic edges
// live in a per-pair overlay and are discarded once that pair is judged.
// Pending openers are reported without any graph search.

use super::tracker::{AllocationPairState, AllocationTracker};
use super::{Leak, LeakIssue, LeakSubject};
use crate::graph::{CallGraph, SyntheticOverlay};
use crate::program::MethodId;
use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

pub struct LeakReachabilityAnalyzer<'g> {
    graph: &'g CallGraph,
    exits: Vec<NodeIndex>,
    parallel: bool,
}

impl<'g> LeakReachabilityAnalyzer<'g> {
    pub fn new(graph: &'g CallGraph, exit_points: &BTreeSet<MethodId>) -> Self {
        let exits = exit_points
            .iter()
            .filter_map(|m| graph.node_index(m))
            .collect();
        Self {
            graph,
            exits,
            parallel: true,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// All resource leaks: never-closed openers first, then unreachable closers
    pub fn analyze(&self, tracker: &AllocationTracker<'_>) -> Vec<Leak> {
        let mut leaks = self.never_closed(tracker);
        let never_closed = leaks.len();

        let completed: Vec<&AllocationPairState> = tracker.completed().collect();
        let unreachable: Vec<Leak> = if self.parallel {
            completed
                .par_iter()
                .flat_map_iter(|state| self.check_pair(state))
                .collect()
        } else {
            completed
                .iter()
                .flat_map(|state| self.check_pair(state))
                .collect()
        };

        info!(
            "Reachability: {} pairs checked against {} exit points, {} never closed, {} closer unreachable",
            completed.len(),
            self.exits.len(),
            never_closed,
            unreachable.len()
        );
        leaks.extend(unreachable);
        leaks
    }

    /// One finding per caller of an opener whose key never completed
    pub fn never_closed(&self, tracker: &AllocationTracker<'_>) -> Vec<Leak> {
        tracker
            .pending()
            .flat_map(|pending| {
                pending.callers.iter().map(move |(caller, site)| {
                    Leak::new(
                        LeakIssue::NeverClosed,
                        LeakSubject::Resource {
                            opener_method: caller.clone(),
                            call_site: *site,
                            resource: pending.opener.clone(),
                            pair: None,
                        },
                    )
                })
            })
            .collect()
    }

    /// Judge a single completed pair on its own overlay
    pub fn check_pair(&self, state: &AllocationPairState) -> Vec<Leak> {
        let definition = &state.definition;
        let mut overlay = SyntheticOverlay::new(self.graph);
        for (caller, site) in state.opener_callers() {
            if let Some(from) = self.graph.node_index(caller) {
                for &exit in &self.exits {
                    overlay.add_synthetic_edge(from, exit, *site);
                }
            }
        }
        debug!(
            "{}: {} synthetic exit edges",
            definition,
            overlay.synthetic_edges().count()
        );

        let closers: HashSet<NodeIndex> = state
            .closer_callers()
            .keys()
            .filter_map(|m| self.graph.node_index(m))
            .collect();

        let resource = state
            .opener()
            .cloned()
            .unwrap_or_else(|| MethodId::simple(&definition.class_name, &definition.opener));

        let mut leaks = Vec::new();
        for (caller, site) in state.opener_callers() {
            let reaches_closer = self
                .graph
                .node_index(caller)
                .is_some_and(|start| overlay.reaches_any(start, &closers));
            if reaches_closer {
                continue;
            }
            debug!("{}: no closer reachable from {}", definition, caller);
            leaks.push(Leak::new(
                LeakIssue::CloserUnreachable,
                LeakSubject::Resource {
                    opener_method: caller.clone(),
                    call_site: *site,
                    resource: resource.clone(),
                    pair: Some(definition.clone()),
                },
            ));
        }
        leaks
    }
}
