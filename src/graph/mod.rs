//! Graph structures: method call graph, per-analysis overlays and the class
//! hierarchy

mod call_graph;
mod hierarchy;
mod overlay;

pub use call_graph::{CallGraph, EdgeInfo};
pub use hierarchy::ClassHierarchy;
pub use overlay::{SyntheticEdge, SyntheticOverlay};
