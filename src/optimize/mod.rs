//! Graph rewriting: a sequence of deterministic passes over the arena.
//!
//! `optimize` copies the reachable part of the graph, runs the passes, and
//! compacts the survivors into a fresh dependency-ordered arena. The
//! original graph is never mutated. Passes are best-effort: an unknown
//! structure is skipped, never an error. When two candidates match a rule
//! the smaller index wins, so results are reproducible.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::error::Result;
use crate::core::{GraphError, NodeId, NodeKind, SymInt};
use crate::graph::{Graph, Update};
use crate::ops::{Op, same_op};

fn trace_enabled() -> bool {
    std::env::var("SYMB_TENSOR_TRACE")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[derive(Default)]
struct Optimizer {
    /// Where the handles of rewritten nodes should land.
    redirect: FxHashMap<NodeId, NodeId>,
}

impl Optimizer {
    fn resolve(&self, mut id: NodeId) -> NodeId {
        while let Some(&next) = self.redirect.get(&id) {
            id = next;
        }
        id
    }

    /// Rewires all consumers of `node` onto `replacement`, deactivates
    /// `node` and records the redirection for outstanding handles.
    fn bypass(&mut self, graph: &mut Graph, node: NodeId, replacement: NodeId) {
        if trace_enabled() {
            eprintln!("[TRACE] bypass {} -> {}", node, replacement);
        }
        let children = std::mem::take(&mut graph.node_mut(node).children);
        for &child in &children {
            graph.replace_parent(child, node, replacement);
        }
        graph.node_mut(replacement).children.extend(children);
        graph.node_mut(node).active = false;
        let target = self.resolve(replacement);
        self.redirect.insert(node, target);
    }

    /// Folds alias chains onto their base nodes.
    fn collapse_aliases(&mut self, graph: &mut Graph) {
        for i in 0..graph.len() {
            let id = NodeId(i);
            if !graph.node(id).active {
                continue;
            }
            if let Op::Alias { parent } = graph.node(id).op {
                self.bypass(graph, id, parent);
            }
        }
    }

    /// Global common-subexpression merging. Live nodes are grouped by
    /// (ancestor tuple, operator name); within a bucket, structurally equal
    /// operators are merged onto the earliest node.
    fn merge(&mut self, graph: &mut Graph) {
        let mut buckets: FxHashMap<(Vec<NodeId>, &'static str), Vec<NodeId>> = FxHashMap::default();
        for i in 0..graph.len() {
            let id = NodeId(i);
            if !graph.node(id).active {
                continue;
            }
            let ancestors = graph.node(id).op.ancestors();
            if ancestors.is_empty() {
                continue;
            }
            let key = (ancestors, graph.node(id).op.name());
            let candidates = buckets.entry(key).or_default();
            let mut merged = false;
            for &survivor in candidates.iter() {
                let equal = {
                    let a = &graph.node(survivor).op;
                    let b = &graph.node(id).op;
                    same_op(graph, a, b)
                };
                if equal {
                    self.bypass(graph, id, survivor);
                    merged = true;
                    break;
                }
            }
            if !merged {
                candidates.push(id);
            }
        }
    }

    /// Folds nodes whose parents are all value constants. Implemented for
    /// `Add`, `Mul`, `Neg` and value-carrying `Broadcast`; other operators
    /// are left as extension points.
    fn constant_folding(&mut self, graph: &mut Graph) {
        for i in 0..graph.len() {
            let id = NodeId(i);
            if !graph.node(id).active {
                continue;
            }
            let op = graph.node(id).op.clone();
            let parents = op.parents();
            if parents.is_empty() {
                continue;
            }
            let value_of = |graph: &Graph, p: NodeId| -> Option<f64> {
                match graph.node(p).op {
                    Op::Value { value, .. } if graph.node(p).active => Some(value),
                    _ => None,
                }
            };
            let folded = match &op {
                Op::Add { parents } => parents
                    .iter()
                    .map(|&p| value_of(graph, p))
                    .sum::<Option<f64>>(),
                Op::Mul { parents } => parents
                    .iter()
                    .map(|&p| value_of(graph, p))
                    .product::<Option<f64>>(),
                Op::Neg { parent } => value_of(graph, *parent).map(|v| -v),
                Op::Broadcast { parent, .. } => value_of(graph, *parent),
                _ => None,
            };
            let Some(value) = folded else { continue };
            if trace_enabled() {
                eprintln!("[TRACE] fold {} to {}", id, value);
            }
            let node = graph.node_mut(id);
            let shape = node.shape.clone();
            let dtype = node.dtype;
            node.op = Op::Value {
                value,
                shape: shape.clone(),
                dtype,
            };
            node.kind = if shape.0.iter().all(SymInt::is_constant) {
                NodeKind::Constant
            } else {
                NodeKind::ConstantDerived
            };
        }
    }

    /// Removes operators whose constant operand is the identity:
    /// `Mul(1, x) -> x`, `Mul(-1, x) -> Neg(x)`, `Pow(x, 1) -> x`.
    fn constant_elimination(&mut self, graph: &mut Graph) {
        for i in 0..graph.len() {
            let id = NodeId(i);
            if !graph.node(id).active {
                continue;
            }
            match graph.node(id).op.clone() {
                Op::Mul { parents } if parents.len() == 2 => {
                    for (constant, other) in [(parents[0], parents[1]), (parents[1], parents[0])] {
                        let Op::Value { value, .. } = graph.node(constant).op else {
                            continue;
                        };
                        // The survivor must already have the product's shape.
                        if graph.node(other).shape != graph.node(id).shape {
                            continue;
                        }
                        if value == 1.0 {
                            self.bypass(graph, id, other);
                        } else if value == -1.0 {
                            graph.node_mut(id).op = Op::Neg { parent: other };
                        } else {
                            continue;
                        }
                        break;
                    }
                }
                Op::Pow { parent1, parent2 } => {
                    if let Op::Value { value, .. } = graph.node(parent2).op {
                        if value == 1.0 && graph.node(parent1).shape == graph.node(id).shape {
                            self.bypass(graph, id, parent1);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// `Neg(Neg(x)) -> x`.
    fn neg_neg(&mut self, graph: &mut Graph) {
        for i in 0..graph.len() {
            let id = NodeId(i);
            if !graph.node(id).active {
                continue;
            }
            let Op::Neg { parent } = graph.node(id).op else {
                continue;
            };
            if !graph.node(parent).active {
                continue;
            }
            let Op::Neg { parent: grandparent } = graph.node(parent).op else {
                continue;
            };
            self.bypass(graph, id, grandparent);
        }
    }

    /// `sum(s₁·s₂·M) -> s₁·s₂·sum(M)`: scalar factors are hoisted out of the
    /// reduction so the backend multiplies scalars, not tensors.
    fn scalar_sum_hoist(&mut self, graph: &mut Graph) -> Result<()> {
        for i in 0..graph.len() {
            let id = NodeId(i);
            if !graph.node(id).active {
                continue;
            }
            let Op::Mul { parents } = graph.node(id).op.clone() else {
                continue;
            };
            // Only safe when the reduction is the product's sole consumer.
            if graph.node(id).children.len() != 1 {
                continue;
            }
            let sum_id = graph.node(id).children[0];
            if !graph.node(sum_id).active {
                continue;
            }
            let Op::Sum { parent, .. } = graph.node(sum_id).op else {
                continue;
            };
            if parent != id {
                continue;
            }
            let (scalars, tensors): (Vec<NodeId>, Vec<NodeId>) = parents
                .iter()
                .copied()
                .partition(|&p| graph.node(p).is_scalar());
            if scalars.is_empty() || tensors.is_empty() {
                continue;
            }
            if trace_enabled() {
                eprintln!("[TRACE] hoist scalars out of sum {}", sum_id);
            }
            if tensors.len() > 1 {
                graph.node_mut(id).op = Op::Mul {
                    parents: tensors.clone(),
                };
            } else {
                self.bypass(graph, id, tensors[0]);
            }
            graph.rebuild_children();

            let mut operands = scalars;
            operands.push(sum_id);
            let hoisted = graph.mul(&operands)?;
            let consumers: Vec<NodeId> = graph
                .node(sum_id)
                .children
                .iter()
                .copied()
                .filter(|&c| c != hoisted && graph.node(c).active)
                .collect();
            for consumer in consumers {
                graph.replace_parent(consumer, sum_id, hoisted);
            }
            self.redirect.insert(sum_id, hoisted);
            graph.rebuild_children();
        }
        Ok(())
    }
}

/// Deactivates nodes no longer reachable from the protected set.
fn sweep_dead(graph: &mut Graph, protected: &FxHashSet<NodeId>) {
    graph.rebuild_children();
    let mut counts: Vec<usize> = graph.nodes().map(|n| n.children.len()).collect();
    let mut stack: Vec<NodeId> = graph
        .nodes()
        .filter(|n| n.active && n.children.is_empty() && !protected.contains(&n.id))
        .map(|n| n.id)
        .collect();
    while let Some(id) = stack.pop() {
        if !graph.node(id).active {
            continue;
        }
        graph.node_mut(id).active = false;
        for ancestor in graph.node(id).op.ancestors() {
            counts[ancestor.0] = counts[ancestor.0].saturating_sub(1);
            if counts[ancestor.0] == 0
                && graph.node(ancestor).active
                && !protected.contains(&ancestor)
            {
                stack.push(ancestor);
            }
        }
    }
    graph.rebuild_children();
}

/// A deterministic topological order of the active nodes: among the ready
/// nodes the smallest id goes first.
fn topo_order(graph: &Graph) -> Vec<NodeId> {
    let mut remaining: Vec<usize> = graph
        .nodes()
        .map(|n| if n.active { n.op.ancestors().len() } else { 0 })
        .collect();
    let mut ready: BinaryHeap<Reverse<usize>> = graph
        .nodes()
        .filter(|n| n.active && remaining[n.id.0] == 0)
        .map(|n| Reverse(n.id.0))
        .collect();
    let mut order = Vec::new();
    while let Some(Reverse(i)) = ready.pop() {
        let id = NodeId(i);
        order.push(id);
        for &child in &graph.node(id).children {
            remaining[child.0] -= 1;
            if remaining[child.0] == 0 {
                ready.push(Reverse(child.0));
            }
        }
    }
    order
}

fn is_elementwise(op: &Op) -> bool {
    matches!(
        op,
        Op::Add { .. }
            | Op::Mul { .. }
            | Op::Div { .. }
            | Op::Square { .. }
            | Op::Exp { .. }
            | Op::Log { .. }
            | Op::Log10 { .. }
            | Op::Log1p { .. }
            | Op::Abs { .. }
            | Op::Softplus { .. }
            | Op::Sin { .. }
            | Op::Cos { .. }
            | Op::Tan { .. }
            | Op::Cot { .. }
            | Op::Sinh { .. }
            | Op::Cosh { .. }
            | Op::Tanh { .. }
            | Op::Coth { .. }
            | Op::Pow { .. }
            | Op::Select { .. }
            | Op::BinaryCrossEntropyLogit { .. }
    )
}

/// Fills the per-node execution metadata: inline hints, in-place reuse,
/// schedule tags.
fn assign_hints(graph: &mut Graph) {
    let mut tag = 0;
    for i in 0..graph.len() {
        let id = NodeId(i);
        if !graph.node(id).active {
            continue;
        }
        let node = graph.node(id);
        let inlined = matches!(
            node.op,
            Op::Input { .. }
                | Op::Shared { .. }
                | Op::Broadcast { .. }
                | Op::Transpose { .. }
                | Op::Neg { .. }
        ) || (node.is_scalar() && node.is_constant())
            || node.children.len() <= 1;
        let mut in_place = None;
        if is_elementwise(&node.op) {
            for parent in node.op.parents() {
                let p = graph.node(parent);
                if p.children.len() == 1
                    && p.kind == NodeKind::InputDerived
                    && p.shape == node.shape
                    && p.dtype == node.dtype
                {
                    in_place = Some(parent);
                    break;
                }
            }
        }
        let node = graph.node_mut(id);
        node.execution.inlined = inlined;
        node.execution.in_place = in_place;
        if !inlined {
            node.execution.tag = Some(tag);
            tag += 1;
        } else {
            node.execution.tag = None;
        }
    }
}

impl Graph {
    /// Optimizes the sub-graph needed for `outputs`, the registered and
    /// provided `updates`, and `inputs`. Returns a fresh compacted graph
    /// together with the re-mapped output, update and input handles; this
    /// graph is left untouched.
    pub fn optimize(
        &self,
        outputs: &[NodeId],
        updates: &[Update],
        inputs: &[NodeId],
    ) -> Result<(Graph, Vec<NodeId>, Vec<Update>, Vec<NodeId>)> {
        for &(shared, update) in updates {
            self.validate_update(shared, update)?;
        }

        // Copy only the relevant part of the graph.
        let mut marked: Vec<NodeId> = Vec::new();
        marked.extend_from_slice(outputs);
        marked.extend_from_slice(inputs);
        for &(shared, update) in self.updates.iter().chain(updates) {
            marked.push(shared);
            marked.push(update);
        }
        let mask = self.ancestors_mask(&marked);
        let order: Vec<NodeId> = (0..self.len())
            .filter(|&i| mask[i])
            .map(NodeId)
            .collect();
        let (mut graph, mapping) = self.copy_nodes_in_order(&order);
        let map = |id: NodeId| -> Result<NodeId> {
            mapping[id.0].ok_or_else(|| {
                GraphError::other(format!("node {} is not reachable from the requested targets", id))
            })
        };
        let outputs: Vec<NodeId> = outputs.iter().map(|&o| map(o)).collect::<Result<_>>()?;
        let inputs: Vec<NodeId> = inputs.iter().map(|&i| map(i)).collect::<Result<_>>()?;
        let updates: Vec<Update> = updates
            .iter()
            .map(|&(s, u)| Ok((map(s)?, map(u)?)))
            .collect::<Result<_>>()?;

        // The passes.
        let mut opt = Optimizer::default();
        opt.collapse_aliases(&mut graph);
        graph.rebuild_children();
        opt.merge(&mut graph);
        graph.rebuild_children();
        opt.constant_folding(&mut graph);
        graph.rebuild_children();
        opt.constant_elimination(&mut graph);
        graph.rebuild_children();
        opt.neg_neg(&mut graph);
        graph.rebuild_children();
        opt.scalar_sum_hoist(&mut graph)?;

        // Handles follow the rewrites; everything else unreachable dies.
        let outputs: Vec<NodeId> = outputs.into_iter().map(|o| opt.resolve(o)).collect();
        let inputs: Vec<NodeId> = inputs.into_iter().map(|i| opt.resolve(i)).collect();
        let updates: Vec<Update> = updates
            .into_iter()
            .map(|(s, u)| (opt.resolve(s), opt.resolve(u)))
            .collect();
        let resolved_updates: Vec<Update> = graph
            .updates
            .iter()
            .map(|&(s, u)| (opt.resolve(s), opt.resolve(u)))
            .collect();
        graph.updates = resolved_updates;

        let mut protected: FxHashSet<NodeId> = FxHashSet::default();
        protected.extend(outputs.iter().copied());
        protected.extend(inputs.iter().copied());
        for &(s, u) in updates.iter().chain(graph.updates.iter()) {
            protected.insert(s);
            protected.insert(u);
        }
        sweep_dead(&mut graph, &protected);

        // Compaction: live nodes move to a fresh arena in dependency order.
        let order = topo_order(&graph);
        let (mut compacted, mapping) = graph.copy_nodes_in_order(&order);
        let remap = |id: NodeId| mapping[id.0].expect("protected nodes survive compaction");
        let outputs: Vec<NodeId> = outputs.into_iter().map(remap).collect();
        let inputs: Vec<NodeId> = inputs.into_iter().map(remap).collect();
        let updates: Vec<Update> = updates.into_iter().map(|(s, u)| (remap(s), remap(u))).collect();

        assign_hints(&mut compacted);
        Ok((compacted, outputs, updates, inputs))
    }
}
