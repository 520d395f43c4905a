//! Local gradient rules: given the incoming gradient message of a node,
//! produce the message for one of its parents.

use crate::core::error::Result;
use crate::core::{GraphError, NodeId};
use crate::graph::Graph;

use super::Op;

fn wrong_gradient(graph: &Graph, node: NodeId, my_grad: NodeId) -> GraphError {
    GraphError::WrongGradient {
        op: graph.node(node).op.name().to_string(),
        nodes: vec![node, my_grad],
    }
}

/// A scalar constant lifted to the gradient level of the message, so that
/// it is grouped with the gradient computation it belongs to.
fn leveled_constant(graph: &mut Graph, value: f64, my_grad: NodeId) -> Result<NodeId> {
    let level = graph.node(my_grad).grad_level;
    let constant = graph.constant(value)?;
    graph.node_mut(constant).grad_level = level;
    Ok(constant)
}

/// Computes the gradient message to parent number `index` of `node`, given
/// the accumulated message `my_grad` at `node`.
pub(crate) fn parent_grad(
    graph: &mut Graph,
    node: NodeId,
    my_grad: NodeId,
    index: usize,
) -> Result<NodeId> {
    let op = graph.node(node).op.clone();
    match op {
        // Leaves and constants have no parents to send to; logical operators
        // and constant views have no differentiable meaning.
        Op::Input { .. }
        | Op::Shared { .. }
        | Op::SymIntValue { .. }
        | Op::Value { .. }
        | Op::Eye { .. }
        | Op::Sequence { .. }
        | Op::MakeConstant { .. }
        | Op::Not { .. }
        | Op::And { .. }
        | Op::Or { .. }
        | Op::Cmp { .. }
        | Op::ApproxEq { .. }
        | Op::IsNan { .. }
        | Op::IsInf { .. }
        | Op::All { .. }
        | Op::Any { .. } => Err(wrong_gradient(graph, node, my_grad)),

        Op::Alias { .. } => Ok(my_grad),
        Op::Cast { parent, .. } => {
            let dtype = graph.node(parent).dtype;
            graph.cast(my_grad, dtype)
        }
        Op::Broadcast { parent, to_shape } => {
            // Sum along the axes the broadcast replicated.
            let parent_shape = graph.node(parent).shape.clone();
            let axes = (0..4)
                .filter(|&i| parent_shape.0[i] != to_shape.0[i])
                .collect();
            graph.sum(my_grad, axes)
        }
        Op::Sum { parent, .. } => {
            let shape = graph.node(parent).shape.clone();
            graph.broadcast(my_grad, shape)
        }

        Op::Add { .. } => Ok(my_grad),
        Op::Neg { .. } => graph.neg(my_grad),
        Op::Mul { parents } => {
            if parents.len() == 2 {
                graph.mul(&[my_grad, parents[1 - index]])
            } else {
                // d(Πxᵢ)/dxₖ = Πxᵢ / xₖ
                let product = graph.mul(&[my_grad, node])?;
                let inverse = graph.recip(parents[index])?;
                graph.mul(&[product, inverse])
            }
        }
        // d(1/x) = -1/x²
        Op::Div { parent } => {
            let square = graph.square(parent)?;
            let inverse = graph.recip(square)?;
            let product = graph.mul(&[my_grad, inverse])?;
            graph.neg(product)
        }
        // d(x²) = 2x
        Op::Square { parent } => {
            let two = leveled_constant(graph, 2.0, my_grad)?;
            graph.mul(&[my_grad, two, parent])
        }
        // d(eˣ) = eˣ
        Op::Exp { .. } => graph.mul(&[my_grad, node]),
        // d(log x) = 1/x
        Op::Log { parent } => {
            let inverse = graph.recip(parent)?;
            graph.mul(&[my_grad, inverse])
        }
        // d(log₁₀ x) = 1/(x·ln 10)
        Op::Log10 { parent } => {
            let inverse = graph.recip(parent)?;
            let ln10 = graph.ln_10()?;
            let ln10_inv = graph.recip(ln10)?;
            graph.mul(&[my_grad, inverse, ln10_inv])
        }
        // d(log(1+x)) = 1/(1+x)
        Op::Log1p { parent } => {
            let one = leveled_constant(graph, 1.0, my_grad)?;
            let shifted = graph.add(&[one, parent])?;
            let inverse = graph.recip(shifted)?;
            graph.mul(&[my_grad, inverse])
        }
        // d|x| = sign(x)
        Op::Abs { parent } => {
            let zero = leveled_constant(graph, 0.0, my_grad)?;
            let sign = graph.ge(parent, zero)?;
            graph.mul(&[my_grad, sign])
        }
        // d softplus(x) = sigmoid(x)
        Op::Softplus { parent, .. } => {
            let sigmoid = graph.sigmoid(parent)?;
            graph.mul(&[my_grad, sigmoid])
        }
        // d sin = cos
        Op::Sin { parent } => {
            let cos = graph.cos(parent)?;
            graph.mul(&[my_grad, cos])
        }
        // d cos = -sin
        Op::Cos { parent } => {
            let sin = graph.sin(parent)?;
            let minus = graph.neg(sin)?;
            graph.mul(&[my_grad, minus])
        }
        // d tan = 1/cos²
        Op::Tan { parent } => {
            let cos = graph.cos(parent)?;
            let square = graph.square(cos)?;
            let inverse = graph.recip(square)?;
            graph.mul(&[my_grad, inverse])
        }
        // d cot = -1/sin²
        Op::Cot { parent } => {
            let sin = graph.sin(parent)?;
            let square = graph.square(sin)?;
            let inverse = graph.recip(square)?;
            let product = graph.mul(&[my_grad, inverse])?;
            graph.neg(product)
        }
        // d sinh = cosh
        Op::Sinh { parent } => {
            let cosh = graph.cosh(parent)?;
            graph.mul(&[my_grad, cosh])
        }
        // d cosh = sinh
        Op::Cosh { parent } => {
            let sinh = graph.sinh(parent)?;
            graph.mul(&[my_grad, sinh])
        }
        // d tanh = 1 - tanh²
        Op::Tanh { .. } => {
            let one = leveled_constant(graph, 1.0, my_grad)?;
            let square = graph.square(node)?;
            let minus = graph.neg(square)?;
            let derivative = graph.add(&[one, minus])?;
            graph.mul(&[my_grad, derivative])
        }
        // d coth = 1 - coth²
        Op::Coth { .. } => {
            let one = leveled_constant(graph, 1.0, my_grad)?;
            let square = graph.square(node)?;
            let minus = graph.neg(square)?;
            let derivative = graph.add(&[one, minus])?;
            graph.mul(&[my_grad, derivative])
        }
        // d(x^y)/dx = y·x^(y-1), d(x^y)/dy = x^y·log x
        Op::Pow { parent1, parent2 } => {
            let product = graph.mul(&[my_grad, node])?;
            if index == 0 {
                let inverse = graph.recip(parent1)?;
                let factor = graph.mul(&[parent2, inverse])?;
                graph.mul(&[product, factor])
            } else {
                let log = graph.log(parent1)?;
                graph.mul(&[product, log])
            }
        }

        Op::Select { condition, .. } => {
            let zero = leveled_constant(graph, 0.0, my_grad)?;
            if index == 0 {
                graph.select(condition, my_grad, zero)
            } else {
                graph.select(condition, zero, my_grad)
            }
        }

        Op::Reshape { parent, .. } => {
            let shape = graph.node(parent).shape.clone();
            graph.reshape(my_grad, shape)
        }
        Op::Reorder { order, .. } => {
            let inverse = super::shape_ops::inverse_order(&order);
            graph.reorder(my_grad, &inverse)
        }
        Op::Diagonal { .. } => graph.diag(my_grad),

        Op::Transpose { .. } => graph.transpose(my_grad),
        // d(A₁⋯Aₙ)/dAₖ: (A₁⋯Aₖ₋₁)ᵀ · msg · (Aₖ₊₁⋯Aₙ)ᵀ
        Op::MatMul { parents } => {
            let left = &parents[..index];
            let right = &parents[index + 1..];
            let left_tr = match left {
                [] => None,
                [single] => Some(graph.transpose(*single)?),
                many => {
                    let chain = graph.matmul(many)?;
                    Some(graph.transpose(chain)?)
                }
            };
            let right_tr = match right {
                [] => None,
                [single] => Some(graph.transpose(*single)?),
                many => {
                    let chain = graph.matmul(many)?;
                    Some(graph.transpose(chain)?)
                }
            };
            match (left_tr, right_tr) {
                (None, Some(r)) => graph.matmul(&[my_grad, r]),
                (Some(l), None) => graph.matmul(&[l, my_grad]),
                (Some(l), Some(r)) => graph.matmul(&[l, my_grad, r]),
                (None, None) => Err(wrong_gradient(graph, node, my_grad)),
            }
        }
        // d(A⁻¹): -A⁻ᵀ · msg · A⁻ᵀ
        Op::MatInv { .. } => {
            let inv_tr = graph.transpose(node)?;
            let product = graph.matmul(&[inv_tr, my_grad, inv_tr])?;
            graph.neg(product)
        }
        // d det(A) = det(A)·A⁻ᵀ
        Op::Det { parent } => {
            let inv = graph.matinv(parent)?;
            let inv_tr = graph.transpose(inv)?;
            graph.mul(&[my_grad, node, inv_tr])
        }
        // d log det(A) = A⁻ᵀ
        Op::LogDet { parent } => {
            let inv = graph.matinv(parent)?;
            let inv_tr = graph.transpose(inv)?;
            graph.mul(&[my_grad, inv_tr])
        }
        // d tr(A) = I
        Op::Trace { parent } => {
            let size = graph.node(parent).shape.0[0].clone();
            let level = graph.node(my_grad).grad_level;
            let eye = graph.eye(size)?;
            graph.node_mut(eye).grad_level = level;
            graph.mul(&[my_grad, eye])
        }

        // The selected results fetch their gradient through the multi node.
        Op::MaxAndArgMax { .. } | Op::SortAndArgSort { .. } => Ok(my_grad),
        Op::MultiIndex {
            parent: multi,
            index: result,
        } => {
            if result != 0 {
                return Err(wrong_gradient(graph, node, my_grad));
            }
            match graph.node(multi).op.clone() {
                // Scatter the message into the positions the values came
                // from.
                Op::MaxAndArgMax { parent, axis } | Op::SortAndArgSort { parent, axis } => {
                    let positions = graph.derived_node(Op::MultiIndex {
                        parent: multi,
                        index: 1,
                    })?;
                    let shape = graph.node(parent).shape.clone();
                    graph.scatter(my_grad, positions, axis, shape)
                }
                _ => Err(wrong_gradient(graph, node, my_grad)),
            }
        }

        Op::Gather { parent, indices, axis } => {
            let shape = graph.node(parent).shape.clone();
            graph.scatter(my_grad, indices, axis, shape)
        }
        Op::Scatter { indices, axis, .. } => graph.gather(my_grad, indices, axis),

        // dE/dp = msg·(softplus(-x) - softplus(x)); dE/dx = msg·(sigmoid(x) - p)
        Op::BinaryCrossEntropyLogit {
            parent1,
            parent2,
            softplus_x,
            softplus_mx,
        } => {
            if index == 0 {
                let difference = graph.sub(softplus_mx, softplus_x)?;
                graph.mul(&[my_grad, difference])
            } else {
                let sigmoid = graph.sigmoid(parent2)?;
                let difference = graph.sub(sigmoid, parent1)?;
                graph.mul(&[my_grad, difference])
            }
        }
    }
}
