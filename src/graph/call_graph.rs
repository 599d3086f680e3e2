use crate::program::{CallEdge, CallSiteId, EdgeKind, MethodId};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// Weight of a call edge in the petgraph representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeInfo {
    pub site: Option<CallSiteId>,
    pub kind: EdgeKind,
}

/// Method-level call graph
///
/// Nodes are methods, edges are calls. The edge list is kept in insertion
/// order so the allocation tracker can scan it deterministically.
#[derive(Debug, Default)]
pub struct CallGraph {
    inner: DiGraph<MethodId, EdgeInfo>,
    index: HashMap<MethodId, NodeIndex>,
    edges: Vec<CallEdge>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges<'a, I>(edges: I) -> Self
    where
        I: IntoIterator<Item = &'a CallEdge>,
    {
        let mut graph = Self::new();
        for edge in edges {
            graph.add_edge(edge.clone());
        }
        graph
    }

    /// Add a method node (idempotent)
    pub fn add_method(&mut self, method: &MethodId) -> NodeIndex {
        if let Some(&idx) = self.index.get(method) {
            return idx;
        }
        let idx = self.inner.add_node(method.clone());
        self.index.insert(method.clone(), idx);
        idx
    }

    pub fn add_edge(&mut self, edge: CallEdge) {
        let from = self.add_method(&edge.caller);
        let to = self.add_method(&edge.callee);
        self.inner.add_edge(
            from,
            to,
            EdgeInfo {
                site: edge.site,
                kind: edge.kind,
            },
        );
        self.edges.push(edge);
    }

    /// Edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &CallEdge> {
        self.edges.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn method_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodId> {
        self.inner.node_weights()
    }

    pub fn node_index(&self, method: &MethodId) -> Option<NodeIndex> {
        self.index.get(method).copied()
    }

    pub fn method(&self, idx: NodeIndex) -> &MethodId {
        &self.inner[idx]
    }

    /// Direct callees of a node
    pub fn successors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.neighbors_directed(idx, Direction::Outgoing)
    }

    /// Underlying petgraph, for the visit-trait walkers
    pub fn inner(&self) -> &DiGraph<MethodId, EdgeInfo> {
        &self.inner
    }
}
