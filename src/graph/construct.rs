//! Input factories: function parameters and shared variables.

use crate::core::error::Result;
use crate::core::{DType, GraphError, NodeId, NodeKind, Shape, SymInt};
use crate::ops::Op;
use crate::shared::SharedRef;

use super::Graph;

impl Graph {
    fn input_node(&mut self, dtype: DType, shape: Shape, name: &str) -> NodeId {
        self.push_node(
            Op::Input { dtype },
            name.to_string(),
            NodeKind::Input,
            dtype,
            shape,
            0,
        )
    }

    /// Creates a four dimensional input variable.
    pub fn tensor4(&mut self, dtype: DType, shape: [SymInt; 4], name: &str) -> NodeId {
        self.input_node(dtype, Shape(shape), name)
    }

    /// Creates a four dimensional input variable with fresh symbolic
    /// dimensions.
    pub fn tensor4_auto(&mut self, dtype: DType, name: &str) -> NodeId {
        let shape = [self.new_sym(), self.new_sym(), self.new_sym(), self.new_sym()];
        self.tensor4(dtype, shape, name)
    }

    /// Creates a three dimensional input variable.
    pub fn tensor3(&mut self, dtype: DType, shape: [SymInt; 3], name: &str) -> NodeId {
        let [d0, d1, d2] = shape;
        self.input_node(dtype, Shape::tensor3(d0, d1, d2), name)
    }

    /// Creates a three dimensional input variable with fresh symbolic
    /// dimensions.
    pub fn tensor3_auto(&mut self, dtype: DType, name: &str) -> NodeId {
        let shape = [self.new_sym(), self.new_sym(), self.new_sym()];
        self.tensor3(dtype, shape, name)
    }

    /// Creates an input matrix.
    pub fn matrix(&mut self, dtype: DType, shape: [SymInt; 2], name: &str) -> NodeId {
        let [d0, d1] = shape;
        self.input_node(dtype, Shape::matrix(d0, d1), name)
    }

    /// Creates an input matrix with fresh symbolic dimensions.
    pub fn matrix_auto(&mut self, dtype: DType, name: &str) -> NodeId {
        let shape = [self.new_sym(), self.new_sym()];
        self.matrix(dtype, shape, name)
    }

    /// Creates a square input matrix.
    pub fn square_matrix(&mut self, dtype: DType, size: SymInt, name: &str) -> NodeId {
        self.input_node(dtype, Shape::matrix(size.clone(), size), name)
    }

    /// Creates an input vector.
    pub fn vector(&mut self, dtype: DType, size: SymInt, name: &str) -> NodeId {
        self.input_node(dtype, Shape::vector(size), name)
    }

    /// Creates an input vector with a fresh symbolic dimension.
    pub fn vector_auto(&mut self, dtype: DType, name: &str) -> NodeId {
        let size = self.new_sym();
        self.vector(dtype, size, name)
    }

    /// Creates an input scalar.
    pub fn scalar(&mut self, dtype: DType, name: &str) -> NodeId {
        self.input_node(dtype, Shape::scalar(), name)
    }

    /// Creates an input with the same shape and dtype as `node`.
    pub fn input_like(&mut self, node: NodeId, name: &str) -> NodeId {
        let dtype = self.node(node).dtype;
        let shape = self.node(node).shape.clone();
        self.input_node(dtype, shape, name)
    }

    /// Creates an input matrix with the same specs as `node`, which must be
    /// a matrix.
    pub fn matrix_like(&mut self, node: NodeId, name: &str) -> Result<NodeId> {
        if !self.node(node).is_matrix() {
            let (nodes, shapes) = self.err_payload(&[node]);
            return Err(GraphError::invalid_arguments(
                "Input",
                nodes,
                shapes,
                "The variable is not a matrix",
            ));
        }
        Ok(self.input_like(node, name))
    }

    /// Creates an input vector with the same specs as `node`, which must be
    /// a vector.
    pub fn vector_like(&mut self, node: NodeId, name: &str) -> Result<NodeId> {
        if !self.node(node).is_vector() {
            let (nodes, shapes) = self.err_payload(&[node]);
            return Err(GraphError::invalid_arguments(
                "Input",
                nodes,
                shapes,
                "The variable is not a vector",
            ));
        }
        Ok(self.input_like(node, name))
    }

    /// Wraps a persistent shared variable as an input leaf of this graph.
    pub fn shared_variable(&mut self, var: SharedRef, name: &str) -> NodeId {
        let dtype = var.dtype;
        let shape = Shape::from(var.shape);
        self.push_node(
            Op::Shared { var },
            name.to_string(),
            NodeKind::Input,
            dtype,
            shape,
            0,
        )
    }
}
