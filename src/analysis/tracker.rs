//! Allocation tracker
//!
//! Pairs opener call sites with closer call sites in a single scan over the
//! call-graph edges. A definition is completed as soon as both its keys have
//! been observed anywhere in the program; whether the closer is actually
//! reachable from each opener call site is decided later by the
//! reachability analyzer.

use super::pairs::{AllocType, AllocationPairDefinition, DefinitionId, PairKey, PairRegistry};
use crate::program::{CallEdge, CallSiteId, MethodId};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Methods calling an opener or closer, with the first call site seen
pub type CallerSites = BTreeMap<MethodId, Option<CallSiteId>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairStatus {
    Pending,
    Completed,
}

/// Runtime state of one observed pair definition
#[derive(Debug, Clone)]
pub struct AllocationPairState {
    pub id: DefinitionId,
    pub definition: AllocationPairDefinition,
    opener: Option<MethodId>,
    opener_callers: CallerSites,
    closer_callers: CallerSites,
    status: PairStatus,
}

impl AllocationPairState {
    fn new(id: DefinitionId, definition: AllocationPairDefinition) -> Self {
        Self {
            id,
            definition,
            opener: None,
            opener_callers: BTreeMap::new(),
            closer_callers: BTreeMap::new(),
            status: PairStatus::Pending,
        }
    }

    pub fn status(&self) -> PairStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status == PairStatus::Completed
    }

    /// First opener method observed for this definition
    pub fn opener(&self) -> Option<&MethodId> {
        self.opener.as_ref()
    }

    pub fn opener_callers(&self) -> &CallerSites {
        &self.opener_callers
    }

    pub fn closer_callers(&self) -> &CallerSites {
        &self.closer_callers
    }

    /// Completion is one-way
    fn complete(&mut self) {
        self.status = PairStatus::Completed;
    }
}

/// An opener whose key was never completed by any definition
#[derive(Debug, Clone)]
pub struct PendingOpener {
    pub key: PairKey,
    /// First opener method seen for this key
    pub opener: MethodId,
    pub callers: CallerSites,
}

/// Counters for logging and the final summary
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackerStats {
    pub edges_scanned: usize,
    pub edges_matched: usize,
}

pub struct AllocationTracker<'r> {
    registry: &'r PairRegistry,
    seen: HashSet<PairKey>,
    completed_keys: HashSet<PairKey>,
    pending: BTreeMap<PairKey, PendingOpener>,
    states: BTreeMap<DefinitionId, AllocationPairState>,
    stats: TrackerStats,
}

impl<'r> AllocationTracker<'r> {
    pub fn new(registry: &'r PairRegistry) -> Self {
        Self {
            registry,
            seen: HashSet::new(),
            completed_keys: HashSet::new(),
            pending: BTreeMap::new(),
            states: BTreeMap::new(),
            stats: TrackerStats::default(),
        }
    }

    /// Run the tracker over all edges in order
    pub fn scan<'e, I>(registry: &'r PairRegistry, edges: I) -> Self
    where
        I: IntoIterator<Item = &'e CallEdge>,
    {
        let mut tracker = Self::new(registry);
        for edge in edges {
            tracker.process_edge(edge);
        }
        info!(
            "Allocation tracking: {} edges scanned, {} matched, {} pairs completed, {} openers unmatched",
            tracker.stats.edges_scanned,
            tracker.stats.edges_matched,
            tracker.completed().count(),
            tracker.pending.len()
        );
        tracker
    }

    pub fn process_edge(&mut self, edge: &CallEdge) {
        self.stats.edges_scanned += 1;

        let alloc_type = self.registry.alloc_type(&edge.callee);
        if alloc_type == AllocType::None {
            return;
        }
        self.stats.edges_matched += 1;

        let key = PairKey::of(&edge.callee);
        self.seen.insert(key.clone());

        if alloc_type == AllocType::Opener && !self.completed_keys.contains(&key) {
            self.pending
                .entry(key.clone())
                .or_insert_with(|| PendingOpener {
                    key: key.clone(),
                    opener: edge.callee.clone(),
                    callers: BTreeMap::new(),
                })
                .callers
                .entry(edge.caller.clone())
                .or_insert(edge.site);
        }

        for (id, definition) in self.registry.matching_definitions(&edge.callee) {
            let state = self
                .states
                .entry(id)
                .or_insert_with(|| AllocationPairState::new(id, definition.clone()));

            let open_key = definition.open_key();
            let complement = if open_key == key {
                state.opener.get_or_insert_with(|| edge.callee.clone());
                state
                    .opener_callers
                    .entry(edge.caller.clone())
                    .or_insert(edge.site);
                definition.close_key()
            } else {
                state
                    .closer_callers
                    .entry(edge.caller.clone())
                    .or_insert(edge.site);
                open_key.clone()
            };

            if self.seen.contains(&complement) {
                if !state.is_completed() {
                    debug!("Pair completed: {}", definition);
                }
                state.complete();
                self.pending.remove(&open_key);
                self.completed_keys.insert(open_key);
            }
        }
    }

    pub fn registry(&self) -> &'r PairRegistry {
        self.registry
    }

    /// Every state created so far, completed or not
    pub fn states(&self) -> impl Iterator<Item = &AllocationPairState> {
        self.states.values()
    }

    pub fn state(&self, id: DefinitionId) -> Option<&AllocationPairState> {
        self.states.get(&id)
    }

    pub fn completed(&self) -> impl Iterator<Item = &AllocationPairState> {
        self.states.values().filter(|s| s.is_completed())
    }

    /// Openers never matched to any closer, one per key
    pub fn pending(&self) -> impl Iterator<Item = &PendingOpener> {
        self.pending.values()
    }

    pub fn is_seen(&self, key: &PairKey) -> bool {
        self.seen.contains(key)
    }

    pub fn stats(&self) -> TrackerStats {
        self.stats
    }
}
