//! Linear algebra operators on matrices.

use crate::core::error::Result;
use crate::core::{DType, GraphError, NodeId, Shape, SymInt};
use crate::graph::Graph;

use super::Op;

/// Inverts the order of all leading non-singular dimensions.
pub(crate) fn transpose_shape(shape: &Shape) -> Shape {
    let mut result = Shape::scalar();
    let mut last_non_unit = 0;
    for i in (0..4).rev() {
        if !shape.0[i].is_one() {
            last_non_unit = i;
            break;
        }
    }
    for i in 0..=last_non_unit {
        result.0[i] = shape.0[last_non_unit - i].clone();
    }
    result
}

impl Graph {
    fn require_square(&self, name: &str, node: NodeId) -> Result<()> {
        if !self.node(node).shape.is_square_matrix() {
            let (ids, shapes) = self.err_payload(&[node]);
            return Err(GraphError::invalid_arguments(
                name,
                ids,
                shapes,
                "Parent must be a square matrix",
            ));
        }
        Ok(())
    }

    fn require_not_b8(&self, name: &str, node: NodeId) -> Result<()> {
        if self.node(node).dtype == DType::b8 {
            let (ids, shapes) = self.err_payload(&[node]);
            return Err(GraphError::invalid_arguments(
                name,
                ids,
                shapes,
                "Parent can not be a b8",
            ));
        }
        Ok(())
    }

    /// Transposition (inverts the order of the non-singular dimensions).
    pub fn transpose(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::Transpose { parent: node })
    }

    /// Chain product of two or more matrices; each adjacent pair must share
    /// the inner dimension.
    pub fn matmul(&mut self, nodes: &[NodeId]) -> Result<NodeId> {
        if nodes.len() < 2 {
            let (ids, shapes) = self.err_payload(nodes);
            return Err(GraphError::invalid_arguments(
                "MatrixMul",
                ids,
                shapes,
                "At least 2 parents are required",
            ));
        }
        for (i, &node) in nodes.iter().enumerate() {
            if !self.node(node).is_matrix() {
                let (ids, shapes) = self.err_payload(nodes);
                return Err(GraphError::invalid_arguments(
                    "MatrixMul",
                    ids,
                    shapes,
                    format!("Parent {} is not a matrix", i),
                ));
            }
        }
        for pair in nodes.windows(2) {
            if self.node(pair[0]).shape.0[1] != self.node(pair[1]).shape.0[0] {
                let (ids, shapes) = self.err_payload(nodes);
                return Err(GraphError::incompatible_shapes("MatrixMul", ids, shapes));
            }
        }
        self.derived_node(Op::MatMul {
            parents: nodes.to_vec(),
        })
    }

    /// Product of two matrices.
    pub fn dot(&mut self, left: NodeId, right: NodeId) -> Result<NodeId> {
        self.matmul(&[left, right])
    }

    /// Inverse of a square matrix.
    pub fn matinv(&mut self, node: NodeId) -> Result<NodeId> {
        self.require_square("MatrixInv", node)?;
        self.derived_node(Op::MatInv { parent: node })
    }

    /// Determinant of a square matrix.
    pub fn det(&mut self, node: NodeId) -> Result<NodeId> {
        self.require_square("Det", node)?;
        self.require_not_b8("Det", node)?;
        self.derived_node(Op::Det { parent: node })
    }

    /// Natural logarithm of the determinant of a square matrix.
    pub fn logdet(&mut self, node: NodeId) -> Result<NodeId> {
        self.require_square("LogDet", node)?;
        self.require_not_b8("LogDet", node)?;
        self.derived_node(Op::LogDet { parent: node })
    }

    /// Trace of a square matrix.
    pub fn trace(&mut self, node: NodeId) -> Result<NodeId> {
        self.require_square("Trace", node)?;
        self.require_not_b8("Trace", node)?;
        self.derived_node(Op::Trace { parent: node })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpose_reverses_leading_dims() {
        let n = SymInt::variable(0);
        let m = SymInt::variable(1);
        let matrix = Shape::matrix(n.clone(), m.clone());
        assert_eq!(transpose_shape(&matrix), Shape::matrix(m.clone(), n.clone()));

        // A column vector has no trailing non-unit dims and stays put; a row
        // vector becomes a column.
        let column = Shape::vector(n.clone());
        assert_eq!(transpose_shape(&column), column);
        let row = Shape::matrix(SymInt::one(), n.clone());
        assert_eq!(transpose_shape(&row), Shape::vector(n.clone()));

        assert_eq!(transpose_shape(&Shape::scalar()), Shape::scalar());
    }
}
