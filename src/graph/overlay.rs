use super::{CallGraph, EdgeInfo};
use crate::program::{CallSiteId, EdgeKind, MethodId};
use petgraph::graph::{DiGraph, EdgeIndex, Neighbors, NodeIndex};
use petgraph::visit::{Bfs, GraphBase, IntoNeighbors, Visitable};
use std::collections::{HashMap, HashSet};
use std::iter;
use std::slice;

/// Edge added on top of the base graph for one analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticEdge {
    pub to: NodeIndex,
    pub info: EdgeInfo,
}

/// Base call graph plus a private set of synthetic edges
///
/// The base graph is never mutated. Each overlay owns its own synthetic
/// edges, so analyses built on separate overlays cannot observe each other.
/// The overlay implements petgraph's visit traits, so the standard walkers
/// run over base and synthetic edges alike.
pub struct SyntheticOverlay<'g> {
    base: &'g CallGraph,
    extra: HashMap<NodeIndex, Vec<SyntheticEdge>>,
}

impl<'g> SyntheticOverlay<'g> {
    pub fn new(base: &'g CallGraph) -> Self {
        Self {
            base,
            extra: HashMap::new(),
        }
    }

    /// Add a `Synthetic` edge anchored at the call site that motivated it.
    /// Adding the same (from, to) twice keeps the first edge.
    pub fn add_synthetic_edge(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        site: Option<CallSiteId>,
    ) {
        let targets = self.extra.entry(from).or_default();
        if targets.iter().all(|e| e.to != to) {
            targets.push(SyntheticEdge {
                to,
                info: EdgeInfo {
                    site,
                    kind: EdgeKind::Synthetic,
                },
            });
        }
    }

    /// Synthetic edges as (from, edge) pairs
    pub fn synthetic_edges(&self) -> impl Iterator<Item = (NodeIndex, &SyntheticEdge)> + '_ {
        self.extra
            .iter()
            .flat_map(|(&from, edges)| edges.iter().map(move |e| (from, e)))
    }

    /// Whether any of `targets` is reachable from `start` (0 hops counts)
    pub fn reaches_any(&self, start: NodeIndex, targets: &HashSet<NodeIndex>) -> bool {
        let mut bfs = Bfs::new(self, start);
        while let Some(node) = bfs.next(self) {
            if targets.contains(&node) {
                return true;
            }
        }
        false
    }
}

fn synthetic_target(edge: &SyntheticEdge) -> NodeIndex {
    edge.to
}

impl GraphBase for SyntheticOverlay<'_> {
    type NodeId = NodeIndex;
    type EdgeId = EdgeIndex;
}

impl Visitable for SyntheticOverlay<'_> {
    type Map = <DiGraph<MethodId, EdgeInfo> as Visitable>::Map;

    // synthetic edges only join existing base nodes, so the base map fits
    fn visit_map(&self) -> Self::Map {
        self.base.inner().visit_map()
    }

    fn reset_map(&self, map: &mut Self::Map) {
        self.base.inner().reset_map(map);
    }
}

impl<'a> IntoNeighbors for &'a SyntheticOverlay<'_> {
    type Neighbors = iter::Chain<
        Neighbors<'a, EdgeInfo>,
        iter::Map<slice::Iter<'a, SyntheticEdge>, fn(&SyntheticEdge) -> NodeIndex>,
    >;

    fn neighbors(self, node: NodeIndex) -> Self::Neighbors {
        let synthetic = self.extra.get(&node).map(Vec::as_slice).unwrap_or(&[]);
        self.base
            .inner()
            .neighbors(node)
            .chain(synthetic.iter().map(synthetic_target as fn(&SyntheticEdge) -> NodeIndex))
    }
}
