//! Logical operators. All results are `b8` and none of them carries a
//! gradient.

use crate::core::error::Result;
use crate::core::{DType, GraphError, NodeId};
use crate::graph::Graph;

use super::{CmpKind, Op};

impl Graph {
    /// Casts a non-`b8` node to `b8` under the graph's cast policy.
    fn ensure_b8(&mut self, name: &str, node: NodeId) -> Result<NodeId> {
        if self.node(node).dtype == DType::b8 {
            return Ok(node);
        }
        let (ids, shapes) = self.err_payload(&[node]);
        self.operate_policy(
            self.cast_policy,
            GraphError::invalid_arguments(
                name,
                ids,
                shapes,
                "Logical operators should be called only on b8 inputs",
            ),
        )?;
        self.cast(node, DType::b8)
    }

    /// Logical not.
    pub fn not(&mut self, node: NodeId) -> Result<NodeId> {
        let parent = self.ensure_b8("Not", node)?;
        self.derived_node(Op::Not { parent })
    }

    /// Logical and.
    pub fn and(&mut self, left: NodeId, right: NodeId) -> Result<NodeId> {
        let left = self.ensure_b8("And", left)?;
        let right = self.ensure_b8("And", right)?;
        let parents = self.nary_elementwise("And", &[left, right])?;
        self.derived_node(Op::And {
            parent1: parents[0],
            parent2: parents[1],
        })
    }

    /// Logical or.
    pub fn or(&mut self, left: NodeId, right: NodeId) -> Result<NodeId> {
        let left = self.ensure_b8("Or", left)?;
        let right = self.ensure_b8("Or", right)?;
        let parents = self.nary_elementwise("Or", &[left, right])?;
        self.derived_node(Op::Or {
            parent1: parents[0],
            parent2: parents[1],
        })
    }

    fn cmp(&mut self, kind: CmpKind, left: NodeId, right: NodeId) -> Result<NodeId> {
        let parents = self.nary_elementwise(kind.name(), &[left, right])?;
        self.derived_node(Op::Cmp {
            kind,
            parent1: parents[0],
            parent2: parents[1],
        })
    }

    /// Elementwise `left > right`.
    pub fn gt(&mut self, left: NodeId, right: NodeId) -> Result<NodeId> {
        self.cmp(CmpKind::Gt, left, right)
    }

    /// Elementwise `left >= right`.
    pub fn ge(&mut self, left: NodeId, right: NodeId) -> Result<NodeId> {
        self.cmp(CmpKind::Ge, left, right)
    }

    /// Elementwise `left < right`.
    pub fn lt(&mut self, left: NodeId, right: NodeId) -> Result<NodeId> {
        self.cmp(CmpKind::Lt, left, right)
    }

    /// Elementwise `left <= right`.
    pub fn le(&mut self, left: NodeId, right: NodeId) -> Result<NodeId> {
        self.cmp(CmpKind::Le, left, right)
    }

    /// Elementwise `left == right`.
    pub fn eq(&mut self, left: NodeId, right: NodeId) -> Result<NodeId> {
        self.cmp(CmpKind::Eq, left, right)
    }

    /// Elementwise `left != right`.
    pub fn neq(&mut self, left: NodeId, right: NodeId) -> Result<NodeId> {
        self.cmp(CmpKind::Neq, left, right)
    }

    /// Elementwise equality up to a tolerance.
    pub fn approx_eq(&mut self, left: NodeId, right: NodeId, tol: f64) -> Result<NodeId> {
        let parents = self.nary_elementwise("ApproxEq", &[left, right])?;
        self.derived_node(Op::ApproxEq {
            parent1: parents[0],
            parent2: parents[1],
            tol,
        })
    }

    /// Elementwise inequality up to a tolerance.
    pub fn approx_neq(&mut self, left: NodeId, right: NodeId, tol: f64) -> Result<NodeId> {
        let eq = self.approx_eq(left, right, tol)?;
        self.not(eq)
    }

    /// Marks the elements that are NaN.
    pub fn is_nan(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::IsNan { parent: node })
    }

    /// Marks the elements that are infinite.
    pub fn is_inf(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::IsInf { parent: node })
    }

    /// True when every element is true.
    pub fn all(&mut self, node: NodeId) -> Result<NodeId> {
        let parent = self.ensure_b8("All", node)?;
        self.derived_node(Op::All { parent })
    }

    /// True when any element is true.
    pub fn any(&mut self, node: NodeId) -> Result<NodeId> {
        let parent = self.ensure_b8("Any", node)?;
        self.derived_node(Op::Any { parent })
    }

    /// Elementwise selection: where `condition` holds take `on_true`, else
    /// `on_false`. The condition is an argument and is never differentiated.
    pub fn select(
        &mut self,
        condition: NodeId,
        on_true: NodeId,
        on_false: NodeId,
    ) -> Result<NodeId> {
        let condition = self.ensure_b8("Select", condition)?;
        let mut on_true = on_true;
        let mut on_false = on_false;
        if self.node(on_true).dtype != self.node(on_false).dtype {
            let (ids, shapes) = self.err_payload(&[condition, on_true, on_false]);
            self.operate_policy(
                self.cast_policy,
                GraphError::invalid_arguments(
                    "Select",
                    ids,
                    shapes,
                    "The two branches of Select should have the same data type",
                ),
            )?;
            let promoted = self.promote(self.node(on_true).dtype, self.node(on_false).dtype);
            if self.node(on_true).dtype != promoted {
                on_true = self.cast(on_true, promoted)?;
            } else {
                on_false = self.cast(on_false, promoted)?;
            }
        }
        let shape = self.verify_elementwise_shapes("Select", &[condition, on_true, on_false])?;
        // Select needs congruent operands, so scalars are wrapped too.
        let condition = self.broadcast(condition, shape.clone())?;
        let on_true = self.broadcast(on_true, shape.clone())?;
        let on_false = self.broadcast(on_false, shape)?;
        self.derived_node(Op::Select {
            condition,
            parent1: on_true,
            parent2: on_false,
        })
    }
}
