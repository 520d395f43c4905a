//! Node records stored in the graph arena.

use std::fmt;

use super::defs::{Device, NodeKind};
use super::dtype::DType;
use super::shape::Shape;
use crate::ops::Op;

/// Identity of a node: its index in the owning arena.
///
/// Indices are dependency-ordered — a node's parents and arguments always
/// have smaller indices. Compaction invalidates outstanding ids and returns
/// a remapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a group in the graph's group tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub usize);

/// Per-node metadata populated by the optimizer for the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionData {
    /// The backend should fold this node into its consumers instead of
    /// materialising a buffer.
    pub inlined: bool,
    /// The node may reuse the storage of this earlier node.
    pub in_place: Option<NodeId>,
    /// Position in the emission schedule, for nodes that own a buffer.
    pub tag: Option<usize>,
}

/// All data stored for a single node of the graph.
///
/// The arena exclusively owns its nodes; `children` are back-references by
/// index, one entry per occurrence of this node in the child's parent or
/// argument list.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub group: GroupId,
    pub device: Device,
    pub kind: NodeKind,
    pub dtype: DType,
    pub shape: Shape,
    pub op: Op,
    pub children: Vec<NodeId>,
    pub grad_level: u16,
    /// Data populated by the optimizer.
    pub execution: ExecutionData,
    /// Inactive nodes are logically removed and dropped at compaction.
    pub active: bool,
    /// Set while a differentiation poisons off-flow nodes as constants.
    pub(crate) temp_constant: bool,
}

impl Node {
    pub fn is_scalar(&self) -> bool {
        self.shape.is_scalar()
    }

    pub fn is_vector(&self) -> bool {
        self.shape.is_vector()
    }

    pub fn is_matrix(&self) -> bool {
        self.shape.is_matrix()
    }

    /// Constant for gradient purposes: either a constant kind, or poisoned
    /// for the duration of a differentiation.
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, NodeKind::Constant | NodeKind::ConstantDerived) || self.temp_constant
    }
}
