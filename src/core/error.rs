//! Error types for graph construction, differentiation and compilation.
//!
//! Every raised error carries the offending node ids, the operator name and
//! the involved shapes in a structured payload that the caller can render.

use std::fmt;

use super::node::NodeId;
use super::shape::Shape;
use super::symbolic::SymbolicError;

/// Errors that can occur while building, differentiating or compiling a
/// graph.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum GraphError {
    /// Shapes differ along a non-1 axis and the graph policy promoted the
    /// implicit broadcast to an error.
    ImplicitBroadcast {
        /// The operator being constructed.
        op: String,
        /// The nodes involved.
        nodes: Vec<NodeId>,
        /// Their shapes.
        shapes: Vec<Shape>,
    },
    /// Shapes genuinely disagree; no broadcast is possible.
    IncompatibleShapes {
        /// The operator being constructed.
        op: String,
        /// The nodes involved.
        nodes: Vec<NodeId>,
        /// Their shapes.
        shapes: Vec<Shape>,
    },
    /// Arity, axis or shape constraints of an operator were violated.
    InvalidArguments {
        /// The operator being constructed.
        op: String,
        /// The nodes involved.
        nodes: Vec<NodeId>,
        /// Their shapes.
        shapes: Vec<Shape>,
        /// Description of the violated constraint.
        msg: String,
    },
    /// A gradient was requested through a non-differentiable node, or a
    /// gradient message arrived at a node whose parents are all constant.
    WrongGradient {
        /// The operator of the receiving node.
        op: String,
        /// The receiving node and the message node.
        nodes: Vec<NodeId>,
    },
    /// Differentiation of a non-scalar objective.
    UnsupportedGradient {
        /// The objective node.
        node: NodeId,
        /// Its (non-scalar) shape.
        shape: Shape,
    },
    /// Compilation requested but a leaf input is unreachable from the
    /// provided inputs.
    MissingRequiredInput {
        /// The requested targets.
        targets: Vec<NodeId>,
        /// The missing input node.
        input: NodeId,
    },
    /// An error raised by the symbolic shape algebra.
    Symbolic(SymbolicError),
    /// Catch-all with message.
    Other {
        /// Description of the failure.
        msg: String,
    },
}

impl GraphError {
    pub fn invalid_arguments(
        op: impl Into<String>,
        nodes: Vec<NodeId>,
        shapes: Vec<Shape>,
        msg: impl Into<String>,
    ) -> Self {
        GraphError::InvalidArguments {
            op: op.into(),
            nodes,
            shapes,
            msg: msg.into(),
        }
    }

    pub fn incompatible_shapes(op: impl Into<String>, nodes: Vec<NodeId>, shapes: Vec<Shape>) -> Self {
        GraphError::IncompatibleShapes {
            op: op.into(),
            nodes,
            shapes,
        }
    }

    pub fn implicit_broadcast(op: impl Into<String>, nodes: Vec<NodeId>, shapes: Vec<Shape>) -> Self {
        GraphError::ImplicitBroadcast {
            op: op.into(),
            nodes,
            shapes,
        }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        GraphError::Other { msg: msg.into() }
    }
}

fn write_ids_and_shapes(f: &mut fmt::Formatter<'_>, nodes: &[NodeId], shapes: &[Shape]) -> fmt::Result {
    write!(f, " (node ids: ")?;
    for (i, id) in nodes.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", id)?;
    }
    write!(f, "; shapes: ")?;
    for (i, shape) in shapes.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", shape)?;
    }
    write!(f, ")")
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::ImplicitBroadcast { op, nodes, shapes } => {
                write!(f, "Implicit broadcast in operator '{}'", op)?;
                write_ids_and_shapes(f, nodes, shapes)
            }
            GraphError::IncompatibleShapes { op, nodes, shapes } => {
                write!(f, "Incompatible dimensions in operator '{}'", op)?;
                write_ids_and_shapes(f, nodes, shapes)
            }
            GraphError::InvalidArguments {
                op,
                nodes,
                shapes,
                msg,
            } => {
                write!(f, "Invalid arguments in operator '{}': {}", op, msg)?;
                write_ids_and_shapes(f, nodes, shapes)
            }
            GraphError::WrongGradient { op, nodes } => {
                write!(
                    f,
                    "A gradient message to node {} was sent, but it is not differentiable (operator '{}'",
                    nodes.first().map(|n| n.0).unwrap_or(0),
                    op,
                )?;
                if let Some(msg) = nodes.get(1) {
                    write!(f, ", message id: {}", msg)?;
                }
                write!(f, ")")
            }
            GraphError::UnsupportedGradient { node, shape } => {
                write!(
                    f,
                    "The gradient operation supports only scalar objectives; node {} has shape {}",
                    node, shape
                )
            }
            GraphError::MissingRequiredInput { targets, input } => {
                write!(f, "Missing required input {} for targets [", input)?;
                for (i, t) in targets.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, "]")
            }
            GraphError::Symbolic(err) => write!(f, "{}", err),
            GraphError::Other { msg } => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for GraphError {}

impl From<SymbolicError> for GraphError {
    fn from(err: SymbolicError) -> Self {
        GraphError::Symbolic(err)
    }
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;
