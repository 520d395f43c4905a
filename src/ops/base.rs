//! Structural operators and the elementwise add/mul family.

use crate::core::error::Result;
use crate::core::{Axes, DType, GraphError, NodeId, Shape, validate_axes};
use crate::graph::Graph;

use super::Op;

impl Graph {
    /// A structural no-op referring to `node`.
    pub fn alias(&mut self, node: NodeId) -> Result<NodeId> {
        Ok(self.append_node(Op::Alias { parent: node }))
    }

    /// Converts `node` to another data type.
    pub fn cast(&mut self, node: NodeId, dtype: DType) -> Result<NodeId> {
        self.derived_node(Op::Cast {
            parent: node,
            dtype,
        })
    }

    /// Explicitly replicates `node` to `shape`. Only legal when each source
    /// dimension is 1 or already equal to the target.
    pub fn broadcast(&mut self, node: NodeId, shape: Shape) -> Result<NodeId> {
        for i in 0..4 {
            let d = &self.node(node).shape.0[i];
            if !d.is_one() && *d != shape.0[i] {
                let (nodes, shapes) = self.err_payload(&[node]);
                return Err(GraphError::invalid_arguments(
                    "Broadcast",
                    nodes,
                    shapes,
                    format!("Can not broadcast to shape {}", shape),
                ));
            }
        }
        if self.node(node).shape == shape {
            return Ok(node);
        }
        self.derived_node(Op::Broadcast {
            parent: node,
            to_shape: shape,
        })
    }

    /// Replicates `node` to the shape of `other`.
    pub fn broadcast_to(&mut self, node: NodeId, other: NodeId) -> Result<NodeId> {
        let shape = self.node(other).shape.clone();
        self.broadcast(node, shape)
    }

    /// Summation reduction along the given axes.
    pub fn sum(&mut self, node: NodeId, axes: Axes) -> Result<NodeId> {
        if !validate_axes(&axes) {
            let (nodes, shapes) = self.err_payload(&[node]);
            return Err(GraphError::invalid_arguments(
                "Sum",
                nodes,
                shapes,
                format!("Invalid axes: {:?}", axes),
            ));
        }
        self.derived_node(Op::Sum { parent: node, axes })
    }

    /// Summation over all four axes, producing a scalar.
    pub fn sum_all(&mut self, node: NodeId) -> Result<NodeId> {
        self.sum(node, vec![0, 1, 2, 3])
    }

    /// Elementwise addition of two or more nodes.
    pub fn add(&mut self, nodes: &[NodeId]) -> Result<NodeId> {
        let parents = self.nary_elementwise("Add", nodes)?;
        // Negated operands go last so that x + (-y) prints as x - y.
        let parents = reorder_to_back(self, parents, |op| matches!(op, Op::Neg { .. }));
        self.derived_node(Op::Add { parents })
    }

    /// `left - right`.
    pub fn sub(&mut self, left: NodeId, right: NodeId) -> Result<NodeId> {
        let neg = self.neg(right)?;
        self.add(&[left, neg])
    }

    /// Elementwise negation.
    pub fn neg(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::Neg { parent: node })
    }

    /// Elementwise multiplication of two or more nodes.
    pub fn mul(&mut self, nodes: &[NodeId]) -> Result<NodeId> {
        let parents = self.nary_elementwise("Mul", nodes)?;
        // Reciprocal operands go last so that x * (1/y) prints as x / y.
        let parents = reorder_to_back(self, parents, |op| matches!(op, Op::Div { .. }));
        self.derived_node(Op::Mul { parents })
    }

    /// Elementwise reciprocal.
    pub fn recip(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::Div { parent: node })
    }

    /// `left / right`, expressed as `left * recip(right)`.
    pub fn divide(&mut self, left: NodeId, right: NodeId) -> Result<NodeId> {
        let recip = self.recip(right)?;
        self.mul(&[left, recip])
    }

    /// Validates the arity and shapes of an elementwise nary operator and
    /// wraps every mismatching non-scalar parent in an explicit broadcast.
    pub(crate) fn nary_elementwise(&mut self, name: &str, nodes: &[NodeId]) -> Result<Vec<NodeId>> {
        if nodes.len() < 2 {
            let (ids, shapes) = self.err_payload(nodes);
            return Err(GraphError::invalid_arguments(
                name,
                ids,
                shapes,
                "At least 2 parents are required",
            ));
        }
        let shape = self.verify_elementwise_shapes(name, nodes)?;
        self.wrap_to_shape(name, nodes, &shape)
    }

    /// Per axis, each parent's size must be 1 or equal to the running
    /// maximum; a genuine disagreement is an incompatible-shapes error.
    pub(crate) fn verify_elementwise_shapes(&self, name: &str, nodes: &[NodeId]) -> Result<Shape> {
        let mut max_shape = self.node(nodes[0]).shape.clone();
        for &node in &nodes[1..] {
            for j in 0..4 {
                let d = &self.node(node).shape.0[j];
                if d.is_one() {
                    continue;
                }
                if max_shape.0[j].is_one() {
                    max_shape.0[j] = d.clone();
                } else if max_shape.0[j] != *d {
                    let (ids, shapes) = self.err_payload(nodes);
                    return Err(GraphError::incompatible_shapes(name, ids, shapes));
                }
            }
        }
        Ok(max_shape)
    }

    /// Applies the broadcast policy, then wraps the parents that need it.
    /// Scalars are left unwrapped; backends replicate them implicitly.
    pub(crate) fn wrap_to_shape(
        &mut self,
        name: &str,
        nodes: &[NodeId],
        shape: &Shape,
    ) -> Result<Vec<NodeId>> {
        let needs_wrap = nodes
            .iter()
            .any(|&n| self.node(n).shape != *shape && !self.node(n).is_scalar());
        if needs_wrap {
            let (ids, shapes) = self.err_payload(nodes);
            self.operate_policy(
                self.broadcast_policy,
                GraphError::implicit_broadcast(name, ids, shapes),
            )?;
        }
        let mut wrapped = Vec::with_capacity(nodes.len());
        for &node in nodes {
            if self.node(node).shape != *shape && !self.node(node).is_scalar() {
                wrapped.push(self.broadcast(node, shape.clone())?);
            } else {
                wrapped.push(node);
            }
        }
        Ok(wrapped)
    }
}

/// Stable partition moving matching operands to the back.
fn reorder_to_back(
    graph: &Graph,
    nodes: Vec<NodeId>,
    matches: impl Fn(&Op) -> bool,
) -> Vec<NodeId> {
    let (back, front): (Vec<NodeId>, Vec<NodeId>) = nodes
        .iter()
        .copied()
        .partition(|&n| matches(&graph.node(n).op));
    if back.is_empty() || front.is_empty() {
        nodes
    } else {
        let mut reordered = front;
        reordered.extend(back);
        reordered
    }
}
