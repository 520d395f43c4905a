//! Operators with more than one logical result, and the gather/scatter pair.
//!
//! A multi-output operator produces its results through `MultiIndex` child
//! nodes. Only the first result (the values) is differentiable; requesting a
//! gradient through the positions signals `WrongGradient`.

use crate::core::error::Result;
use crate::core::{DType, GraphError, NodeId, Shape};
use crate::graph::Graph;

use super::Op;

impl Graph {
    fn multi_pair(&mut self, op: Op) -> Result<(NodeId, NodeId)> {
        let multi = self.derived_node(op)?;
        let multi = super::base_node(self, multi);
        let values = self.derived_node(Op::MultiIndex {
            parent: multi,
            index: 0,
        })?;
        let positions = self.derived_node(Op::MultiIndex {
            parent: multi,
            index: 1,
        })?;
        Ok((values, positions))
    }

    fn validate_axis_op(&self, name: &str, node: NodeId, axis: usize) -> Result<()> {
        if axis > 3 {
            let (ids, shapes) = self.err_payload(&[node]);
            return Err(GraphError::invalid_arguments(
                name,
                ids,
                shapes,
                "Axis should be between [0, 3]",
            ));
        }
        if self.node(node).dtype == DType::b8 {
            let (ids, shapes) = self.err_payload(&[node]);
            return Err(GraphError::invalid_arguments(
                name,
                ids,
                shapes,
                "Parent can not be of type b8",
            ));
        }
        Ok(())
    }

    /// The maximum along `axis` together with its positions.
    pub fn max_and_argmax(&mut self, node: NodeId, axis: usize) -> Result<(NodeId, NodeId)> {
        self.validate_axis_op("MaxAndArgMax", node, axis)?;
        self.multi_pair(Op::MaxAndArgMax { parent: node, axis })
    }

    /// The maximum along `axis`.
    pub fn max(&mut self, node: NodeId, axis: usize) -> Result<NodeId> {
        Ok(self.max_and_argmax(node, axis)?.0)
    }

    /// The positions of the maximum along `axis`.
    pub fn argmax(&mut self, node: NodeId, axis: usize) -> Result<NodeId> {
        Ok(self.max_and_argmax(node, axis)?.1)
    }

    /// The values sorted along `axis` together with the sorting permutation.
    pub fn sort_and_argsort(&mut self, node: NodeId, axis: usize) -> Result<(NodeId, NodeId)> {
        self.validate_axis_op("SortAndArgSort", node, axis)?;
        self.multi_pair(Op::SortAndArgSort { parent: node, axis })
    }

    /// The values sorted along `axis`.
    pub fn sort(&mut self, node: NodeId, axis: usize) -> Result<NodeId> {
        Ok(self.sort_and_argsort(node, axis)?.0)
    }

    /// The sorting permutation along `axis`.
    pub fn argsort(&mut self, node: NodeId, axis: usize) -> Result<NodeId> {
        Ok(self.sort_and_argsort(node, axis)?.1)
    }

    /// Takes elements along `axis` at the positions given by `indices`.
    /// The index tensor must match the parent shape on every other axis.
    pub fn gather(&mut self, node: NodeId, indices: NodeId, axis: usize) -> Result<NodeId> {
        if axis > 3 {
            let (ids, shapes) = self.err_payload(&[node, indices]);
            return Err(GraphError::invalid_arguments(
                "Gather",
                ids,
                shapes,
                "Axis should be between [0, 3]",
            ));
        }
        for i in 0..4 {
            if i != axis && self.node(node).shape.0[i] != self.node(indices).shape.0[i] {
                let (ids, shapes) = self.err_payload(&[node, indices]);
                return Err(GraphError::invalid_arguments(
                    "Gather",
                    ids,
                    shapes,
                    "The node and its indices should agree on every axis but the indexed one",
                ));
            }
        }
        self.derived_node(Op::Gather {
            parent: node,
            indices,
            axis,
        })
    }

    /// Writes `node` into a zero tensor of shape `result` at the positions
    /// given by `indices` along `axis`. Adjoint of [`Graph::gather`].
    pub fn scatter(
        &mut self,
        node: NodeId,
        indices: NodeId,
        axis: usize,
        result: Shape,
    ) -> Result<NodeId> {
        if axis > 3 {
            let (ids, shapes) = self.err_payload(&[node, indices]);
            return Err(GraphError::invalid_arguments(
                "Scatter",
                ids,
                shapes,
                "Axis should be between [0, 3]",
            ));
        }
        for i in 0..4 {
            if i != axis && self.node(node).shape.0[i] != result.0[i] {
                let (ids, mut shapes) = self.err_payload(&[node, indices]);
                shapes.push(result.clone());
                return Err(GraphError::invalid_arguments(
                    "Scatter",
                    ids,
                    shapes,
                    "The node and the result should agree on every axis but the indexed one",
                ));
            }
        }
        self.derived_node(Op::Scatter {
            parent: node,
            indices,
            axis,
            result,
        })
    }
}
