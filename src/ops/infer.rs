//! Inference of shape, dtype, kind and gradient level for each operator.
//!
//! Inference runs at construction time, after the factory has validated its
//! preconditions, so these functions assume structurally valid operators.

use crate::core::{DType, NodeKind, Shape, SymInt};
use crate::graph::Graph;

use super::Op;
use super::linalg::transpose_shape;

/// The elementwise broadcast of the parent shapes: per axis, the first non-1
/// dimension. Shape compatibility was verified by the factory.
fn elementwise_shape(graph: &Graph, parents: &[crate::core::NodeId]) -> Shape {
    let mut shape = Shape::scalar();
    for &p in parents {
        for j in 0..4 {
            if shape.0[j].is_one() {
                shape.0[j] = graph.node(p).shape.0[j].clone();
            }
        }
    }
    shape
}

pub(crate) fn shape(op: &Op, graph: &Graph) -> Shape {
    match op {
        // Input shapes are provided by the factory, never inferred.
        Op::Input { .. } => Shape::scalar(),
        Op::Shared { var } => Shape::from(var.shape),
        Op::SymIntValue { .. } => Shape::scalar(),
        Op::Value { shape, .. } => shape.clone(),
        Op::Eye { size, .. } => Shape::matrix(size.clone(), size.clone()),
        Op::Sequence { start, end, .. } => Shape::vector(end - start),
        Op::MakeConstant { parent }
        | Op::Alias { parent }
        | Op::Cast { parent, .. }
        | Op::Neg { parent }
        | Op::Div { parent }
        | Op::Square { parent }
        | Op::Exp { parent }
        | Op::Log { parent }
        | Op::Log10 { parent }
        | Op::Log1p { parent }
        | Op::Abs { parent }
        | Op::Softplus { parent, .. }
        | Op::Sin { parent }
        | Op::Cos { parent }
        | Op::Tan { parent }
        | Op::Cot { parent }
        | Op::Sinh { parent }
        | Op::Cosh { parent }
        | Op::Tanh { parent }
        | Op::Coth { parent }
        | Op::Not { parent }
        | Op::IsNan { parent }
        | Op::IsInf { parent }
        | Op::MatInv { parent } => graph.node(*parent).shape.clone(),
        Op::Broadcast { to_shape, .. } => to_shape.clone(),
        Op::Add { parents } | Op::Mul { parents } => elementwise_shape(graph, parents),
        Op::Pow { parent1, parent2 }
        | Op::And { parent1, parent2 }
        | Op::Or { parent1, parent2 }
        | Op::Cmp {
            parent1, parent2, ..
        }
        | Op::ApproxEq {
            parent1, parent2, ..
        }
        | Op::BinaryCrossEntropyLogit {
            parent1, parent2, ..
        } => elementwise_shape(graph, &[*parent1, *parent2]),
        Op::All { .. } | Op::Any { .. } | Op::Det { .. } | Op::LogDet { .. } | Op::Trace { .. } => {
            Shape::scalar()
        }
        Op::Select {
            condition,
            parent1,
            parent2,
        } => elementwise_shape(graph, &[*condition, *parent1, *parent2]),
        Op::Sum { parent, axes } => {
            let mut shape = graph.node(*parent).shape.clone();
            for &axis in axes {
                shape.0[axis] = SymInt::one();
            }
            shape
        }
        Op::Reshape { shape, .. } => shape.clone(),
        Op::Reorder { parent, order } => {
            let parent_shape = &graph.node(*parent).shape;
            Shape([
                parent_shape.0[order[0]].clone(),
                parent_shape.0[order[1]].clone(),
                parent_shape.0[order[2]].clone(),
                parent_shape.0[order[3]].clone(),
            ])
        }
        Op::Diagonal { parent } => {
            let parent_shape = &graph.node(*parent).shape;
            if graph.node(*parent).is_vector() {
                Shape::matrix(parent_shape.0[0].clone(), parent_shape.0[0].clone())
            } else {
                Shape::vector(parent_shape.0[0].clone())
            }
        }
        Op::Transpose { parent } => transpose_shape(&graph.node(*parent).shape),
        Op::MatMul { parents } => {
            let first = &graph.node(parents[0]).shape;
            let last = &graph.node(*parents.last().expect("MatMul has parents")).shape;
            Shape::matrix(first.0[0].clone(), last.0[1].clone())
        }
        Op::MaxAndArgMax { parent, axis } => {
            let mut shape = graph.node(*parent).shape.clone();
            shape.0[*axis] = SymInt::one();
            shape
        }
        Op::SortAndArgSort { parent, .. } => graph.node(*parent).shape.clone(),
        Op::MultiIndex { parent, index } => multi_result_shape(graph, *parent, *index),
        Op::Gather {
            parent,
            indices,
            axis,
        } => {
            let mut shape = graph.node(*parent).shape.clone();
            shape.0[*axis] = graph.node(*indices).shape.0[*axis].clone();
            shape
        }
        Op::Scatter { result, .. } => result.clone(),
    }
}

/// Shape of the `index`-th logical result of a multi-output operator.
pub(crate) fn multi_result_shape(graph: &Graph, multi: crate::core::NodeId, _index: usize) -> Shape {
    // Both results of MaxAndArgMax and of SortAndArgSort share one shape.
    graph.node(multi).shape.clone()
}

pub(crate) fn dtype(op: &Op, graph: &Graph) -> DType {
    match op {
        Op::Input { dtype } => *dtype,
        Op::Shared { var } => var.dtype,
        Op::SymIntValue { .. } => graph.max_int,
        Op::Value { dtype, .. } | Op::Eye { dtype, .. } | Op::Sequence { dtype, .. } => *dtype,
        Op::Cast { dtype, .. } => *dtype,
        Op::MakeConstant { parent }
        | Op::Alias { parent }
        | Op::Broadcast { parent, .. }
        | Op::Neg { parent }
        | Op::Div { parent }
        | Op::Square { parent }
        | Op::Exp { parent }
        | Op::Log { parent }
        | Op::Log10 { parent }
        | Op::Log1p { parent }
        | Op::Abs { parent }
        | Op::Softplus { parent, .. }
        | Op::Sin { parent }
        | Op::Cos { parent }
        | Op::Tan { parent }
        | Op::Cot { parent }
        | Op::Sinh { parent }
        | Op::Cosh { parent }
        | Op::Tanh { parent }
        | Op::Coth { parent }
        | Op::Sum { parent, .. }
        | Op::Reshape { parent, .. }
        | Op::Reorder { parent, .. }
        | Op::Diagonal { parent }
        | Op::Transpose { parent }
        | Op::MatInv { parent }
        | Op::Det { parent }
        | Op::Trace { parent }
        | Op::Gather { parent, .. }
        | Op::Scatter { parent, .. } => graph.node(*parent).dtype,
        Op::Add { parents } | Op::Mul { parents } | Op::MatMul { parents } => {
            let mut dtype = DType::b8;
            for &p in parents {
                dtype = graph.promote(dtype, graph.node(p).dtype);
            }
            dtype
        }
        Op::Pow { parent1, parent2 } => {
            graph.promote(graph.node(*parent1).dtype, graph.node(*parent2).dtype)
        }
        Op::Not { .. }
        | Op::And { .. }
        | Op::Or { .. }
        | Op::Cmp { .. }
        | Op::ApproxEq { .. }
        | Op::IsNan { .. }
        | Op::IsInf { .. }
        | Op::All { .. }
        | Op::Any { .. } => DType::b8,
        Op::Select { parent1, .. } => graph.node(*parent1).dtype,
        Op::LogDet { .. } | Op::BinaryCrossEntropyLogit { .. } => graph.max_float,
        Op::MaxAndArgMax { parent, .. } | Op::SortAndArgSort { parent, .. } => {
            graph.node(*parent).dtype
        }
        Op::MultiIndex { parent, index } => {
            // Result 0 carries the values, result 1 the integer positions.
            if *index == 0 {
                graph.node(*parent).dtype
            } else {
                graph.max_int
            }
        }
    }
}

fn derived_kind(graph: &Graph, parents: &[crate::core::NodeId]) -> NodeKind {
    if parents
        .iter()
        .any(|&p| graph.node(p).kind.is_input_like())
    {
        NodeKind::InputDerived
    } else {
        NodeKind::ConstantDerived
    }
}

fn constant_kind(shape: &Shape) -> NodeKind {
    if shape.0.iter().all(SymInt::is_constant) {
        NodeKind::Constant
    } else {
        NodeKind::ConstantDerived
    }
}

pub(crate) fn kind(op: &Op, graph: &Graph) -> NodeKind {
    match op {
        Op::Input { .. } | Op::Shared { .. } => NodeKind::Input,
        Op::SymIntValue { value } => {
            if value.is_constant() {
                NodeKind::Constant
            } else {
                NodeKind::ConstantDerived
            }
        }
        Op::Value { shape, .. } => constant_kind(shape),
        Op::Eye { size, .. } => {
            constant_kind(&Shape::matrix(size.clone(), size.clone()))
        }
        Op::Sequence { start, end, .. } => constant_kind(&Shape::vector(end - start)),
        // Constant views and logical results never carry gradients.
        Op::MakeConstant { .. }
        | Op::Not { .. }
        | Op::And { .. }
        | Op::Or { .. }
        | Op::Cmp { .. }
        | Op::ApproxEq { .. }
        | Op::IsNan { .. }
        | Op::IsInf { .. }
        | Op::All { .. }
        | Op::Any { .. } => NodeKind::ConstantDerived,
        Op::MultiIndex { parent, index } => {
            if *index == 0 {
                graph.node(*parent).kind
            } else {
                NodeKind::ConstantDerived
            }
        }
        _ => derived_kind(graph, &op.parents()),
    }
}

pub(crate) fn grad_level(op: &Op, graph: &Graph) -> u16 {
    op.parents()
        .iter()
        .map(|&p| graph.node(p).grad_level)
        .max()
        .unwrap_or(0)
}
