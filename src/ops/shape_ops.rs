//! Shape-changing operators: reshape, axis reordering, diagonal.

use crate::core::error::Result;
use crate::core::{GraphError, NodeId, Shape, SymInt};
use crate::graph::Graph;

use super::Op;

/// Canonicalises a (possibly short) axis order into a full permutation of
/// `0..4`, filling the remaining axes in place.
fn canonical_order(order: &[usize]) -> [usize; 4] {
    let mut full = [0usize; 4];
    let mut used = [false; 4];
    for (i, &axis) in order.iter().enumerate() {
        full[i] = axis;
        used[axis] = true;
    }
    let mut next = order.len();
    for axis in 0..4 {
        if !used[axis] {
            full[next] = axis;
            next += 1;
        }
    }
    full
}

/// The inverse of a full permutation.
pub(crate) fn inverse_order(order: &[usize; 4]) -> [usize; 4] {
    let mut inverse = [0usize; 4];
    for (i, &axis) in order.iter().enumerate() {
        inverse[axis] = i;
    }
    inverse
}

impl Graph {
    /// Reshapes `node`; the element count must not change.
    pub fn reshape(&mut self, node: NodeId, shape: Shape) -> Result<NodeId> {
        if self.node(node).shape.elements() != shape.elements() {
            let (ids, mut shapes) = self.err_payload(&[node]);
            shapes.push(shape.clone());
            return Err(GraphError::invalid_arguments(
                "Reshape",
                ids,
                shapes,
                "Total number of elements must not change",
            ));
        }
        self.derived_node(Op::Reshape {
            parent: node,
            shape,
        })
    }

    /// Collapses the trailing axes so that only `dims` remain.
    pub fn flatten(&mut self, node: NodeId, dims: usize) -> Result<NodeId> {
        if dims == 0 || dims > 4 {
            let (ids, shapes) = self.err_payload(&[node]);
            return Err(GraphError::invalid_arguments(
                "Reshape",
                ids,
                shapes,
                format!("dims = {} is outside [1,4]", dims),
            ));
        }
        let mut shape = self.node(node).shape.clone();
        for i in (dims..4).rev() {
            shape.0[i - 1] = &shape.0[i] * &shape.0[i - 1];
            shape.0[i] = SymInt::one();
        }
        self.reshape(node, shape)
    }

    /// Permutes the axes of `node`.
    pub fn reorder(&mut self, node: NodeId, order: &[usize]) -> Result<NodeId> {
        let invalid = |msg: &str| {
            let (ids, shapes) = self.err_payload(&[node]);
            GraphError::invalid_arguments("Reorder", ids, shapes, msg)
        };
        if order.is_empty() || order.len() > 4 {
            return Err(invalid("The ordering must contain between 1 and 4 elements"));
        }
        let mut used = [false; 4];
        for &axis in order {
            if axis > 3 {
                return Err(invalid("The ordering must contain elements in the range [0,3]"));
            }
            if used[axis] {
                return Err(invalid("The ordering must not have repeating elements"));
            }
            used[axis] = true;
        }
        let shape = &self.node(node).shape;
        if shape.is_tensor4_strict() && order.len() < 4 {
            return Err(invalid(
                "The ordering for a 4 dimensional tensor should contain exactly 4 elements",
            ));
        }
        if shape.is_tensor3_strict() && order.len() < 3 {
            return Err(invalid(
                "The ordering for a 3 dimensional tensor should contain at least 3 elements",
            ));
        }
        if shape.is_matrix_strict() && order.len() < 2 {
            return Err(invalid("The ordering for a matrix should contain at least 2 elements"));
        }
        self.derived_node(Op::Reorder {
            parent: node,
            order: canonical_order(order),
        })
    }

    /// The diagonal view: a vector becomes a square matrix with that
    /// diagonal, a square matrix becomes the vector of its diagonal.
    pub fn diag(&mut self, node: NodeId) -> Result<NodeId> {
        if !self.node(node).is_matrix() {
            let (ids, shapes) = self.err_payload(&[node]);
            return Err(GraphError::invalid_arguments(
                "Diag",
                ids,
                shapes,
                "Parent is not a matrix or a vector",
            ));
        }
        if !self.node(node).is_vector() && !self.node(node).shape.is_square_matrix() {
            let (ids, shapes) = self.err_payload(&[node]);
            return Err(GraphError::invalid_arguments(
                "Diag",
                ids,
                shapes,
                "Parent is not a square matrix",
            ));
        }
        self.derived_node(Op::Diagonal { parent: node })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_canonicalisation() {
        assert_eq!(canonical_order(&[1, 0]), [1, 0, 2, 3]);
        assert_eq!(canonical_order(&[2, 0, 1, 3]), [2, 0, 1, 3]);
        assert_eq!(canonical_order(&[3]), [3, 0, 1, 2]);
    }

    #[test]
    fn order_inversion() {
        assert_eq!(inverse_order(&[2, 0, 1, 3]), [1, 2, 0, 3]);
        assert_eq!(inverse_order(&[0, 1, 2, 3]), [0, 1, 2, 3]);
    }
}
