//! The computation graph: an arena of nodes in dependency order.

use std::sync::Arc;

use crate::core::error::Result;
use crate::core::group::GroupTree;
use crate::core::{
    DType, Device, ExecutionData, GraphError, GroupId, Node, NodeId, NodeKind, Policy, Shape,
    SymInt, promote,
};
use crate::ops::{self, Op};
use crate::shared::SharedRegistry;

mod construct;

/// A pair `(shared node, replacement node)`: at the end of one evaluation
/// the shared variable is overwritten with the value of the replacement.
pub type Update = (NodeId, NodeId);

/// The computation graph.
///
/// The graph exclusively owns all nodes. Nodes are created only through the
/// factory methods and are never destroyed individually — rewrite passes mark
/// them inactive, and a compaction copies live nodes into a fresh arena.
#[derive(Debug, Clone)]
pub struct Graph {
    /// Human-readable name, used in diagnostics and the visual output.
    pub name: String,
    /// The default device tag for new nodes.
    pub default_device: Device,
    /// The maximum floating point precision to allow.
    pub max_float: DType,
    /// The maximum integer precision to allow.
    pub max_int: DType,
    /// Policy for implicit broadcasts.
    pub broadcast_policy: Policy,
    /// Policy for type promotions.
    pub promotion_policy: Policy,
    /// Policy for implicit casts.
    pub cast_policy: Policy,
    pub(crate) nodes: Vec<Node>,
    pub(crate) updates: Vec<Update>,
    pub(crate) temporary_updates: Vec<Update>,
    pub(crate) groups: GroupTree,
    pub(crate) current_group: GroupId,
    /// Raised while a differentiation is generating gradient nodes.
    pub(crate) grad_level: u16,
    pub(crate) sym_count: u16,
    registry: Arc<SharedRegistry>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// A new empty graph bound to the process-wide shared-variable registry.
    pub fn new() -> Self {
        Self::with_registry(SharedRegistry::global())
    }

    /// A new empty graph bound to an isolated shared-variable registry.
    pub fn with_registry(registry: Arc<SharedRegistry>) -> Self {
        Graph {
            name: "Function".to_string(),
            default_device: Device::MASTER,
            max_float: DType::f32,
            max_int: DType::i32,
            broadcast_policy: Policy::Warn,
            promotion_policy: Policy::Warn,
            cast_policy: Policy::Warn,
            nodes: Vec::new(),
            updates: Vec::new(),
            temporary_updates: Vec::new(),
            groups: GroupTree::default(),
            current_group: GroupTree::ROOT,
            grad_level: 0,
            sym_count: 0,
            registry,
        }
    }

    /// A graph with the same settings, groups and registry but no nodes.
    pub(crate) fn empty_like(&self) -> Self {
        Graph {
            name: format!("{}_copy", self.name),
            default_device: self.default_device,
            max_float: self.max_float,
            max_int: self.max_int,
            broadcast_policy: self.broadcast_policy,
            promotion_policy: self.promotion_policy,
            cast_policy: self.cast_policy,
            nodes: Vec::new(),
            updates: Vec::new(),
            temporary_updates: Vec::new(),
            groups: self.groups.clone(),
            current_group: GroupTree::ROOT,
            grad_level: 0,
            sym_count: self.sym_count,
            registry: Arc::clone(&self.registry),
        }
    }

    pub fn registry(&self) -> &Arc<SharedRegistry> {
        &self.registry
    }

    /// The number of nodes in the arena, inactive ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node behind an id.
    ///
    /// # Panics
    ///
    /// Panics if the id does not belong to this graph (stale after a
    /// compaction, or from another graph).
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Iterates over all nodes in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// The persistent updates registered on this graph.
    pub fn updates(&self) -> &[Update] {
        &self.updates
    }

    /// The group tree.
    pub fn groups(&self) -> &GroupTree {
        &self.groups
    }

    /// Type promotion under this graph's precision caps.
    pub fn promote(&self, type1: DType, type2: DType) -> DType {
        promote(type1, type2, self.max_float, self.max_int)
    }

    /// Returns the next unused symbolic integer.
    pub fn new_sym(&mut self) -> SymInt {
        self.sym_count += 1;
        SymInt::variable(self.sym_count - 1)
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Returns the group at `full_name`, creating intermediate groups on
    /// demand.
    pub fn get_group(&mut self, full_name: &str) -> GroupId {
        self.groups.get_or_create(full_name)
    }

    /// Makes `full_name` the group for subsequently created nodes.
    pub fn set_group(&mut self, full_name: &str) {
        self.current_group = self.get_group(full_name);
    }

    /// Returns to the root group.
    pub fn reset_group(&mut self) {
        self.current_group = GroupTree::ROOT;
    }

    pub fn current_group(&self) -> GroupId {
        self.current_group
    }

    // ------------------------------------------------------------------
    // Node creation
    // ------------------------------------------------------------------

    pub(crate) fn push_node(
        &mut self,
        op: Op,
        name: String,
        kind: NodeKind,
        dtype: DType,
        shape: Shape,
        grad_level: u16,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let ancestors = op.ancestors();
        self.nodes.push(Node {
            id,
            name,
            group: self.current_group,
            device: self.default_device,
            kind,
            dtype,
            shape,
            op,
            children: Vec::new(),
            grad_level,
            execution: ExecutionData::default(),
            active: true,
            temp_constant: false,
        });
        for ancestor in ancestors {
            self.nodes[ancestor.0].children.push(id);
        }
        id
    }

    /// Appends a node for `op`, inferring its dtype, shape, kind and
    /// gradient level. Does not search for an existing equivalent.
    pub(crate) fn append_node(&mut self, op: Op) -> NodeId {
        let shape = ops::infer::shape(&op, self);
        let dtype = ops::infer::dtype(&op, self);
        let kind = ops::infer::kind(&op, self);
        let grad_level = self.grad_level.max(ops::infer::grad_level(&op, self));
        self.push_node(op, "Derived Node".to_string(), kind, dtype, shape, grad_level)
    }

    /// Finds an active node performing the same operation, scanning the
    /// children of the operator's first parent.
    pub(crate) fn find_same_node(&self, op: &Op) -> Option<NodeId> {
        let first = *op.parents().first()?;
        for &candidate in &self.node(first).children {
            if !self.node(candidate).active {
                continue;
            }
            let base = ops::base_node(self, candidate);
            if ops::same_op(self, &self.node(base).op, op) {
                return Some(base);
            }
        }
        None
    }

    /// Creates a new derived node, reusing a structurally equal neighbour
    /// when one exists (in which case an alias of it is returned).
    pub(crate) fn derived_node(&mut self, op: Op) -> Result<NodeId> {
        if !matches!(op, Op::Alias { .. }) {
            if let Some(existing) = self.find_same_node(&op) {
                return self.alias(existing);
            }
        }
        Ok(self.append_node(op))
    }

    // ------------------------------------------------------------------
    // Policies and error payloads
    // ------------------------------------------------------------------

    /// Applies an error policy to a recoverable construction event.
    pub(crate) fn operate_policy(&self, policy: Policy, err: GraphError) -> Result<()> {
        match policy {
            Policy::Quiet => Ok(()),
            Policy::Warn => {
                eprintln!("Warning: {}", err);
                Ok(())
            }
            Policy::Raise => Err(err),
        }
    }

    /// The `(ids, shapes)` payload for a structured error.
    pub(crate) fn err_payload(&self, nodes: &[NodeId]) -> (Vec<NodeId>, Vec<Shape>) {
        (
            nodes.to_vec(),
            nodes.iter().map(|&n| self.node(n).shape.clone()).collect(),
        )
    }

    // ------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------

    /// Registers a persistent update for the shared node.
    pub fn add_update(&mut self, shared: NodeId, update: NodeId) -> Result<()> {
        self.validate_update(shared, update)?;
        self.updates.push((shared, update));
        Ok(())
    }

    pub(crate) fn validate_update(&self, shared: NodeId, update: NodeId) -> Result<()> {
        if !matches!(self.node(shared).op, Op::Shared { .. }) {
            let (nodes, shapes) = self.err_payload(&[shared, update]);
            return Err(GraphError::invalid_arguments(
                "Update",
                nodes,
                shapes,
                "First argument can only be a shared variable",
            ));
        }
        if self.node(shared).shape != self.node(update).shape {
            let (nodes, shapes) = self.err_payload(&[shared, update]);
            return Err(GraphError::incompatible_shapes("Update", nodes, shapes));
        }
        if self.node(shared).dtype != self.node(update).dtype {
            let (nodes, shapes) = self.err_payload(&[shared, update]);
            return Err(GraphError::invalid_arguments(
                "Update",
                nodes,
                shapes,
                "The shared variable and the update should have the same dtype",
            ));
        }
        Ok(())
    }

    pub(crate) fn add_temporary_updates(&mut self, updates: &[Update]) -> Result<()> {
        for &(shared, update) in updates {
            self.validate_update(shared, update)?;
        }
        self.temporary_updates.extend_from_slice(updates);
        Ok(())
    }

    pub(crate) fn clear_temporary_updates(&mut self) {
        self.temporary_updates.clear();
    }

    // ------------------------------------------------------------------
    // Masks and sub-graph copying
    // ------------------------------------------------------------------

    /// Masks all nodes reachable downward (through children) from `marked`.
    pub(crate) fn descendants_mask(&self, marked: &[NodeId]) -> Vec<bool> {
        let mut mask = vec![false; self.nodes.len()];
        for &m in marked {
            mask[m.0] = true;
        }
        for i in 0..self.nodes.len() {
            if mask[i] {
                for &child in &self.nodes[i].children {
                    mask[child.0] = true;
                }
            }
        }
        mask
    }

    /// Masks all nodes reachable upward (through parents and arguments)
    /// from `marked`.
    pub(crate) fn ancestors_mask(&self, marked: &[NodeId]) -> Vec<bool> {
        let mut mask = vec![false; self.nodes.len()];
        for &m in marked {
            mask[m.0] = true;
        }
        for i in (0..self.nodes.len()).rev() {
            if mask[i] {
                for ancestor in self.nodes[i].op.ancestors() {
                    mask[ancestor.0] = true;
                }
            }
        }
        mask
    }

    /// Copies the listed nodes into a fresh graph, in the given order. Every
    /// ancestor of a listed node must appear earlier in the list. Returns the
    /// new graph and the old-to-new id mapping.
    pub(crate) fn copy_nodes_in_order(&self, order: &[NodeId]) -> (Graph, Vec<Option<NodeId>>) {
        let mut new_graph = self.empty_like();
        let mut mapping: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        for &old_id in order {
            let node = self.node(old_id);
            let op = node.op.remap(&mut |id| {
                mapping[id.0].expect("ancestors precede their descendants in a copy order")
            });
            let new_id = NodeId(new_graph.nodes.len());
            let ancestors = op.ancestors();
            new_graph.nodes.push(Node {
                id: new_id,
                name: node.name.clone(),
                group: node.group,
                device: node.device,
                kind: node.kind,
                dtype: node.dtype,
                shape: node.shape.clone(),
                op,
                children: Vec::new(),
                grad_level: node.grad_level,
                execution: node.execution.clone(),
                active: true,
                temp_constant: false,
            });
            for ancestor in ancestors {
                new_graph.nodes[ancestor.0].children.push(new_id);
            }
            mapping[old_id.0] = Some(new_id);
        }
        // Updates survive the copy when both ends were copied.
        for &(shared, update) in &self.updates {
            if let (Some(s), Some(u)) = (mapping[shared.0], mapping[update.0]) {
                new_graph.updates.push((s, u));
            }
        }
        (new_graph, mapping)
    }

    // ------------------------------------------------------------------
    // Rewrite support
    // ------------------------------------------------------------------

    /// Rewrites every reference to `old` in the operator of `node` to `new`.
    pub(crate) fn replace_parent(&mut self, node: NodeId, old: NodeId, new: NodeId) {
        let op = self.nodes[node.0]
            .op
            .remap(&mut |id| if id == old { new } else { id });
        self.nodes[node.0].op = op;
    }

    /// Rebuilds every children list from the operators of the active nodes.
    pub(crate) fn rebuild_children(&mut self) {
        for node in &mut self.nodes {
            node.children.clear();
        }
        for i in 0..self.nodes.len() {
            if !self.nodes[i].active {
                continue;
            }
            for ancestor in self.nodes[i].op.ancestors() {
                self.nodes[ancestor.0].children.push(NodeId(i));
            }
        }
    }

    // ------------------------------------------------------------------
    // Invariant checking (used heavily by the test-suite)
    // ------------------------------------------------------------------

    /// Verifies the structural invariants of the arena.
    pub fn check_invariants(&self) -> Result<()> {
        for node in &self.nodes {
            if !node.active {
                continue;
            }
            for ancestor in node.op.ancestors() {
                if ancestor.0 >= node.id.0 {
                    return Err(GraphError::other(format!(
                        "node {} depends on later node {}",
                        node.id, ancestor
                    )));
                }
                let count = self
                    .node(ancestor)
                    .children
                    .iter()
                    .filter(|&&c| c == node.id)
                    .count();
                let expected = node
                    .op
                    .ancestors()
                    .iter()
                    .filter(|&&a| a == ancestor)
                    .count();
                if count != expected {
                    return Err(GraphError::other(format!(
                        "children list of {} lists {} {} times, expected {}",
                        ancestor, node.id, count, expected
                    )));
                }
            }
            let kind = ops::infer::kind(&node.op, self);
            let stored_input = node.kind.is_input_like();
            if kind.is_input_like() != stored_input {
                return Err(GraphError::other(format!(
                    "node {} stores kind {} but its operator infers {}",
                    node.id, node.kind, kind
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for node in &self.nodes {
            if !node.active {
                continue;
            }
            write!(f, "{}: {}(", node.id, node.op.name())?;
            for (i, p) in node.op.ancestors().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", p)?;
            }
            writeln!(f, ") {} {}", node.dtype, node.shape)?;
        }
        Ok(())
    }
}
