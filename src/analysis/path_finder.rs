use super::DiagnosticPath;
use crate::graph::CallGraph;
use crate::program::MethodId;
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, VecDeque};

/// Shortest call path from an entry method to a target, for diagnostics
///
/// Searches the base graph only; synthetic edges never appear in a path.
pub struct PathFinder<'g> {
    graph: &'g CallGraph,
    roots: Vec<NodeIndex>,
}

impl<'g> PathFinder<'g> {
    pub fn new(graph: &'g CallGraph, roots: Vec<NodeIndex>) -> Self {
        Self { graph, roots }
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// BFS from all roots at once; the first root to reach the target wins
    pub fn find_path(&self, target: &MethodId) -> Option<Vec<MethodId>> {
        let target = self.graph.node_index(target)?;
        let mut parent: HashMap<NodeIndex, Option<NodeIndex>> = HashMap::new();
        let mut queue = VecDeque::new();

        for &root in &self.roots {
            if parent.contains_key(&root) {
                continue;
            }
            parent.insert(root, None);
            queue.push_back(root);
        }

        while let Some(node) = queue.pop_front() {
            if node == target {
                return Some(self.rebuild(&parent, node));
            }
            for next in self.graph.successors(node) {
                if !parent.contains_key(&next) {
                    parent.insert(next, Some(node));
                    queue.push_back(next);
                }
            }
        }
        None
    }

    pub fn diagnose(&self, target: &MethodId) -> DiagnosticPath {
        match self.find_path(target) {
            Some(path) => DiagnosticPath::Found(path),
            None => DiagnosticPath::NotFound,
        }
    }

    fn rebuild(
        &self,
        parent: &HashMap<NodeIndex, Option<NodeIndex>>,
        end: NodeIndex,
    ) -> Vec<MethodId> {
        let mut path = vec![self.graph.method(end).clone()];
        let mut current = end;
        while let Some(&Some(prev)) = parent.get(&current) {
            path.push(self.graph.method(prev).clone());
            current = prev;
        }
        path.reverse();
        path
    }
}
