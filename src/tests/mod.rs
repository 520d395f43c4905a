//! Integration tests: end-to-end behaviour of construction, differentiation,
//! rewriting and compilation.

mod backend_compile;
mod differentiation;
mod optimization;
mod shape_dtype;
mod symbolic_props;

use crate::{Graph, SharedRegistry};

/// A graph with an isolated shared-variable registry so tests can run in
/// parallel.
pub(crate) fn test_graph() -> Graph {
    let mut graph = Graph::with_registry(SharedRegistry::new());
    graph.broadcast_policy = crate::Policy::Quiet;
    graph.promotion_policy = crate::Policy::Quiet;
    graph.cast_policy = crate::Policy::Quiet;
    graph
}
