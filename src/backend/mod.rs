//! The backend interface.
//!
//! `compile` optimizes a graph and binds everything a native backend needs
//! to emit code: the ordered arena, per-node emission metadata, the shared
//! variable table, the input position mapping and the updates to apply after
//! each evaluation. The core never assumes a particular backend language or
//! runtime — a backend walks [`CompiledFunction::steps`] in order and
//! produces a callable of signature `(inputs[], shared[]) -> outputs[]`.

use rustc_hash::FxHashMap;

use crate::core::error::Result;
use crate::core::{GraphError, NodeId};
use crate::graph::{Graph, Update};
use crate::ops::Op;
use crate::shared::SharedRef;

/// One entry of the emission schedule: a node in dependency order together
/// with the hints the optimizer attached to it.
#[derive(Debug, Clone)]
pub struct EmitStep {
    pub id: NodeId,
    pub op_name: &'static str,
    /// Fold this node into its consumers instead of materialising a buffer.
    pub inlined: bool,
    /// The node may reuse the storage of this earlier node.
    pub in_place: Option<NodeId>,
    /// Position in the buffer schedule, for nodes that own one.
    pub tag: Option<usize>,
}

/// An optimized graph bound to everything a backend needs to emit and run
/// it.
#[derive(Debug)]
pub struct CompiledFunction {
    /// The optimized, compacted graph.
    pub graph: Graph,
    /// The function inputs, in positional order.
    pub inputs: Box<[NodeId]>,
    /// The requested outputs.
    pub outputs: Box<[NodeId]>,
    /// All updates to apply after each evaluation: the graph's persistent
    /// updates followed by the ones provided at compile time.
    pub updates: Box<[Update]>,
    /// Maps an input node id to its positional index.
    pub input_positions: FxHashMap<NodeId, usize>,
    /// The shared variables referenced by the graph, in arena order.
    pub shared: Box<[SharedRef]>,
    /// One step per node, in emission order.
    pub steps: Box<[EmitStep]>,
}

/// The contract a native backend must satisfy. The backend walks the
/// compiled function's steps, emits per-node code using the inline and
/// in-place hints, and turns the result into something callable.
pub trait Backend {
    /// The callable the backend produces.
    type Function;
    /// The backend's own error type.
    type Error;

    fn build(&mut self, function: &CompiledFunction) -> std::result::Result<Self::Function, Self::Error>;
}

/// Optimizes `graph` for the given outputs and updates and binds the
/// emission metadata.
///
/// The provided updates are registered as temporary updates of the graph for
/// the duration of the compilation and cleared again on every exit path.
/// Fails with `MissingRequiredInput` if the optimized graph still contains
/// an input leaf that is not among `inputs`.
pub fn compile(
    graph: &mut Graph,
    inputs: &[NodeId],
    outputs: &[NodeId],
    updates: &[Update],
) -> Result<CompiledFunction> {
    graph.add_temporary_updates(updates)?;
    let result = bind(graph, inputs, outputs, updates);
    graph.clear_temporary_updates();
    result
}

fn bind(
    graph: &Graph,
    inputs: &[NodeId],
    outputs: &[NodeId],
    updates: &[Update],
) -> Result<CompiledFunction> {
    let (optimized, new_outputs, new_updates, new_inputs) =
        graph.optimize(outputs, updates, inputs)?;

    for node in optimized.nodes() {
        if matches!(node.op, Op::Input { .. }) && !new_inputs.contains(&node.id) {
            return Err(GraphError::MissingRequiredInput {
                targets: new_outputs.clone(),
                input: node.id,
            });
        }
    }

    let input_positions: FxHashMap<NodeId, usize> = new_inputs
        .iter()
        .enumerate()
        .map(|(position, &id)| (id, position))
        .collect();

    let shared: Vec<SharedRef> = optimized
        .nodes()
        .filter_map(|node| match &node.op {
            Op::Shared { var } => Some(var.clone()),
            _ => None,
        })
        .collect();

    let steps: Vec<EmitStep> = optimized
        .nodes()
        .map(|node| EmitStep {
            id: node.id,
            op_name: node.op.name(),
            inlined: node.execution.inlined,
            in_place: node.execution.in_place,
            tag: node.execution.tag,
        })
        .collect();

    let mut all_updates: Vec<Update> = optimized.updates().to_vec();
    all_updates.extend(new_updates);

    Ok(CompiledFunction {
        graph: optimized,
        inputs: new_inputs.into_boxed_slice(),
        outputs: new_outputs.into_boxed_slice(),
        updates: all_updates.into_boxed_slice(),
        input_positions,
        shared: shared.into_boxed_slice(),
        steps: steps.into_boxed_slice(),
    })
}
