//! The operator catalog.
//!
//! Operators form a closed tagged union. Each variant declares its parents
//! (tensor inputs that participate in differentiation), its arguments
//! (tensor inputs that only route data), inference rules for shape, dtype,
//! kind and gradient level, a local gradient rule, and a structural equality
//! predicate used for common-subexpression discovery.
//!
//! The per-category builder methods on [`Graph`] live in the submodules,
//! mirroring the catalog split: `base` (structural + add/mul family),
//! `constants`, `elementwise`, `logical`, `shape_ops`, `linalg`, `multi`,
//! `optimized`.

use crate::core::{Axes, DType, NodeId, NodeKind, Shape, SymInt};
use crate::graph::Graph;
use crate::shared::SharedRef;

pub(crate) mod base;
pub(crate) mod constants;
pub(crate) mod elementwise;
pub(crate) mod grad;
pub(crate) mod infer;
pub(crate) mod linalg;
pub(crate) mod logical;
pub(crate) mod multi;
pub(crate) mod optimized;
pub(crate) mod shape_ops;

pub use constants::IntoConstant;

/// Comparison predicates shared by the logical comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpKind {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Neq,
}

impl CmpKind {
    pub fn name(self) -> &'static str {
        match self {
            CmpKind::Gt => "Gt",
            CmpKind::Ge => "Ge",
            CmpKind::Lt => "Lt",
            CmpKind::Le => "Le",
            CmpKind::Eq => "Eq",
            CmpKind::Neq => "Neq",
        }
    }
}

/// The operator value stored on every node.
#[derive(Debug, Clone)]
pub enum Op {
    // ---- inputs ----
    /// A function parameter.
    Input { dtype: DType },
    /// A persistent variable identified by id; its value lives outside the
    /// core.
    Shared { var: SharedRef },

    // ---- constants ----
    /// A symbolic integer as a scalar node.
    SymIntValue { value: SymInt },
    /// A tensor filled with the same value.
    Value { value: f64, shape: Shape, dtype: DType },
    /// The identity matrix of the given size.
    Eye { size: SymInt, dtype: DType },
    /// The vector `start..end-1`.
    Sequence { start: SymInt, end: SymInt, dtype: DType },
    /// A view of the parent that poisons gradient flow.
    MakeConstant { parent: NodeId },

    // ---- structural ----
    /// A structural no-op referring to an existing node.
    Alias { parent: NodeId },
    /// Conversion to another data type.
    Cast { parent: NodeId, dtype: DType },
    /// Explicit per-axis replication to the given shape.
    Broadcast { parent: NodeId, to_shape: Shape },

    // ---- elementwise nary ----
    Add { parents: Vec<NodeId> },
    Mul { parents: Vec<NodeId> },

    // ---- elementwise unary ----
    Neg { parent: NodeId },
    /// Elementwise reciprocal.
    Div { parent: NodeId },
    Square { parent: NodeId },
    Exp { parent: NodeId },
    Log { parent: NodeId },
    Log10 { parent: NodeId },
    Log1p { parent: NodeId },
    Abs { parent: NodeId },
    /// `x` when `x > threshold`, else `log1p(exp(x))`.
    Softplus { parent: NodeId, threshold: i64 },
    Sin { parent: NodeId },
    Cos { parent: NodeId },
    Tan { parent: NodeId },
    Cot { parent: NodeId },
    Sinh { parent: NodeId },
    Cosh { parent: NodeId },
    Tanh { parent: NodeId },
    Coth { parent: NodeId },
    /// The first parent raised to the second, elementwise.
    Pow { parent1: NodeId, parent2: NodeId },

    // ---- logical ----
    Not { parent: NodeId },
    And { parent1: NodeId, parent2: NodeId },
    Or { parent1: NodeId, parent2: NodeId },
    Cmp { kind: CmpKind, parent1: NodeId, parent2: NodeId },
    ApproxEq { parent1: NodeId, parent2: NodeId, tol: f64 },
    IsNan { parent: NodeId },
    IsInf { parent: NodeId },
    All { parent: NodeId },
    Any { parent: NodeId },
    /// Elementwise choice between the parents; the condition is an argument
    /// and is never differentiated.
    Select {
        condition: NodeId,
        parent1: NodeId,
        parent2: NodeId,
    },

    // ---- shape ----
    /// Summation reduction along the given axes.
    Sum { parent: NodeId, axes: Axes },
    Reshape { parent: NodeId, shape: Shape },
    /// Axis permutation, canonicalised to length four.
    Reorder { parent: NodeId, order: [usize; 4] },
    /// Vector to square matrix, or square matrix to its diagonal vector.
    Diagonal { parent: NodeId },

    // ---- linear algebra ----
    Transpose { parent: NodeId },
    /// Chain product of matrices.
    MatMul { parents: Vec<NodeId> },
    MatInv { parent: NodeId },
    Det { parent: NodeId },
    LogDet { parent: NodeId },
    Trace { parent: NodeId },

    // ---- multiple outputs ----
    MaxAndArgMax { parent: NodeId, axis: usize },
    SortAndArgSort { parent: NodeId, axis: usize },
    /// Selects one of the logical results of a multi-output operator.
    MultiIndex { parent: NodeId, index: usize },

    // ---- indexing ----
    /// Takes elements along `axis` at the positions given by `indices`
    /// (an argument).
    Gather {
        parent: NodeId,
        indices: NodeId,
        axis: usize,
    },
    /// Adjoint of [`Op::Gather`]: writes the parent into a tensor of shape
    /// `result` at the positions given by `indices`.
    Scatter {
        parent: NodeId,
        indices: NodeId,
        axis: usize,
        result: Shape,
    },

    // ---- fused ----
    /// Binary cross-entropy between `parent1` and `sigmoid(parent2)`,
    /// keeping `softplus(x)` and `softplus(-x)` as arguments so the gradient
    /// does not recompute them.
    BinaryCrossEntropyLogit {
        parent1: NodeId,
        parent2: NodeId,
        softplus_x: NodeId,
        softplus_mx: NodeId,
    },
}

impl Op {
    /// Unique name of the operator, used for merging and display.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Input { .. } => "Input",
            Op::Shared { .. } => "Shared",
            Op::SymIntValue { .. } => "SymInt",
            Op::Value { .. } => "Value",
            Op::Eye { .. } => "Eye",
            Op::Sequence { .. } => "Sequence",
            Op::MakeConstant { .. } => "MakeConst",
            Op::Alias { .. } => "Alias",
            Op::Cast { .. } => "Cast",
            Op::Broadcast { .. } => "Broadcast",
            Op::Add { .. } => "Add",
            Op::Mul { .. } => "Mul",
            Op::Neg { .. } => "Neg",
            Op::Div { .. } => "Div",
            Op::Square { .. } => "Square",
            Op::Exp { .. } => "Exp",
            Op::Log { .. } => "Log",
            Op::Log10 { .. } => "Log10",
            Op::Log1p { .. } => "Log1p",
            Op::Abs { .. } => "Abs",
            Op::Softplus { .. } => "Softplus",
            Op::Sin { .. } => "Sin",
            Op::Cos { .. } => "Cos",
            Op::Tan { .. } => "Tan",
            Op::Cot { .. } => "Cot",
            Op::Sinh { .. } => "Sinh",
            Op::Cosh { .. } => "Cosh",
            Op::Tanh { .. } => "Tanh",
            Op::Coth { .. } => "Coth",
            Op::Pow { .. } => "Pow",
            Op::Not { .. } => "Not",
            Op::And { .. } => "And",
            Op::Or { .. } => "Or",
            Op::Cmp { kind, .. } => kind.name(),
            Op::ApproxEq { .. } => "ApproxEq",
            Op::IsNan { .. } => "IsNaN",
            Op::IsInf { .. } => "IsInf",
            Op::All { .. } => "All",
            Op::Any { .. } => "Any",
            Op::Select { .. } => "Select",
            Op::Sum { .. } => "Sum",
            Op::Reshape { .. } => "Reshape",
            Op::Reorder { .. } => "Reorder",
            Op::Diagonal { .. } => "Diag",
            Op::Transpose { .. } => "Transpose",
            Op::MatMul { .. } => "MatrixMul",
            Op::MatInv { .. } => "MatrixInv",
            Op::Det { .. } => "Det",
            Op::LogDet { .. } => "LogDet",
            Op::Trace { .. } => "Trace",
            Op::MaxAndArgMax { .. } => "MaxAndArgMax",
            Op::SortAndArgSort { .. } => "SortAndArgSort",
            Op::MultiIndex { .. } => "MultiIndex",
            Op::Gather { .. } => "Gather",
            Op::Scatter { .. } => "Scatter",
            Op::BinaryCrossEntropyLogit { .. } => "BinCrossEntropyLogit",
        }
    }

    /// The tensor inputs that participate in differentiation.
    pub fn parents(&self) -> Vec<NodeId> {
        match self {
            Op::Input { .. }
            | Op::Shared { .. }
            | Op::SymIntValue { .. }
            | Op::Value { .. }
            | Op::Eye { .. }
            | Op::Sequence { .. } => Vec::new(),
            Op::MakeConstant { parent }
            | Op::Alias { parent }
            | Op::Cast { parent, .. }
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
            | Op::Not { parent }
            | Op::IsNan { parent }
            | Op::IsInf { parent }
            | Op::All { parent }
            | Op::Any { parent }
            | Op::Sum { parent, .. }
            | Op::Reshape { parent, .. }
            | Op::Reorder { parent, .. }
            | Op::Diagonal { parent }
            | Op::Transpose { parent }
            | Op::MatInv { parent }
            | Op::Det { parent }
            | Op::LogDet { parent }
            | Op::Trace { parent }
            | Op::MaxAndArgMax { parent, .. }
            | Op::SortAndArgSort { parent, .. }
            | Op::MultiIndex { parent, .. }
            | Op::Gather { parent, .. }
            | Op::Scatter { parent, .. } => vec![*parent],
            Op::Add { parents } | Op::Mul { parents } | Op::MatMul { parents } => parents.clone(),
            Op::Pow { parent1, parent2 }
            | Op::And { parent1, parent2 }
            | Op::Or { parent1, parent2 }
            | Op::Cmp {
                parent1, parent2, ..
            }
            | Op::ApproxEq {
                parent1, parent2, ..
            }
            | Op::Select {
                parent1, parent2, ..
            }
            | Op::BinaryCrossEntropyLogit {
                parent1, parent2, ..
            } => vec![*parent1, *parent2],
        }
    }

    /// The tensor inputs that do not participate in differentiation.
    pub fn arguments(&self) -> Vec<NodeId> {
        match self {
            Op::Select { condition, .. } => vec![*condition],
            Op::Gather { indices, .. } | Op::Scatter { indices, .. } => vec![*indices],
            Op::BinaryCrossEntropyLogit {
                softplus_x,
                softplus_mx,
                ..
            } => vec![*softplus_x, *softplus_mx],
            _ => Vec::new(),
        }
    }

    /// The union of parents and arguments.
    pub fn ancestors(&self) -> Vec<NodeId> {
        let mut ancestors = self.parents();
        ancestors.extend(self.arguments());
        ancestors
    }

    /// Rewrites every node reference through `f`. Used when copying a
    /// sub-graph into another arena and when a rewrite pass replaces a
    /// parent.
    pub(crate) fn remap(&self, f: &mut impl FnMut(NodeId) -> NodeId) -> Op {
        let mut op = self.clone();
        match &mut op {
            Op::Input { .. }
            | Op::Shared { .. }
            | Op::SymIntValue { .. }
            | Op::Value { .. }
            | Op::Eye { .. }
            | Op::Sequence { .. } => {}
            Op::MakeConstant { parent }
            | Op::Alias { parent }
            | Op::Cast { parent, .. }
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
            | Op::Not { parent }
            | Op::IsNan { parent }
            | Op::IsInf { parent }
            | Op::All { parent }
            | Op::Any { parent }
            | Op::Sum { parent, .. }
            | Op::Reshape { parent, .. }
            | Op::Reorder { parent, .. }
            | Op::Diagonal { parent }
            | Op::Transpose { parent }
            | Op::MatInv { parent }
            | Op::Det { parent }
            | Op::LogDet { parent }
            | Op::Trace { parent }
            | Op::MaxAndArgMax { parent, .. }
            | Op::SortAndArgSort { parent, .. }
            | Op::MultiIndex { parent, .. } => *parent = f(*parent),
            Op::Add { parents } | Op::Mul { parents } | Op::MatMul { parents } => {
                for p in parents {
                    *p = f(*p);
                }
            }
            Op::Pow { parent1, parent2 }
            | Op::And { parent1, parent2 }
            | Op::Or { parent1, parent2 }
            | Op::Cmp {
                parent1, parent2, ..
            }
            | Op::ApproxEq {
                parent1, parent2, ..
            } => {
                *parent1 = f(*parent1);
                *parent2 = f(*parent2);
            }
            Op::Select {
                condition,
                parent1,
                parent2,
            } => {
                *condition = f(*condition);
                *parent1 = f(*parent1);
                *parent2 = f(*parent2);
            }
            Op::Gather {
                parent, indices, ..
            }
            | Op::Scatter {
                parent, indices, ..
            } => {
                *parent = f(*parent);
                *indices = f(*indices);
            }
            Op::BinaryCrossEntropyLogit {
                parent1,
                parent2,
                softplus_x,
                softplus_mx,
            } => {
                *parent1 = f(*parent1);
                *parent2 = f(*parent2);
                *softplus_x = f(*softplus_x);
                *softplus_mx = f(*softplus_mx);
            }
        }
        op
    }
}

/// Skips alias operators to reach the base operator of a node.
pub(crate) fn base_node(graph: &Graph, mut id: NodeId) -> NodeId {
    while let Op::Alias { parent } = &graph.node(id).op {
        id = *parent;
    }
    id
}

/// Checks if two nodes are symbolically equivalent.
///
/// Two distinct `Input` nodes are never equivalent; everything else compares
/// by base operator, unwrapping alias chains.
pub(crate) fn symbolic_equals(graph: &Graph, node1: NodeId, node2: NodeId) -> bool {
    if node1 == node2 {
        return true;
    }
    let n1 = graph.node(node1);
    let n2 = graph.node(node2);
    if n1.kind != n2.kind {
        return false;
    }
    if n1.kind == NodeKind::Input {
        return false;
    }
    let b1 = base_node(graph, node1);
    let b2 = base_node(graph, node2);
    if b1 == b2 {
        return true;
    }
    same_op(graph, &graph.node(b1).op, &graph.node(b2).op)
}

fn multiset_equals(graph: &Graph, left: &[NodeId], right: &[NodeId]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut used = vec![false; left.len()];
    for &r in right {
        let mut found = false;
        for (j, &l) in left.iter().enumerate() {
            if !used[j] && symbolic_equals(graph, l, r) {
                used[j] = true;
                found = true;
                break;
            }
        }
        if !found {
            return false;
        }
    }
    true
}

fn ordered_equals(graph: &Graph, left: &[NodeId], right: &[NodeId]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(&l, &r)| symbolic_equals(graph, l, r))
}

/// Structural equality of two base operators.
///
/// Commutative operators compare their parent multisets; parametrised
/// operators additionally compare their parameters. `Input` and `Shared`
/// leaves compare by identity (`Shared` by variable id).
pub(crate) fn same_op(graph: &Graph, a: &Op, b: &Op) -> bool {
    // transpose(transpose(x)) is structurally x
    if let Op::Transpose { parent } = a {
        if let Op::Transpose { parent: inner } = &graph.node(*parent).op {
            return same_op(graph, &graph.node(base_node(graph, *inner)).op, b);
        }
    }
    if let Op::Transpose { parent } = b {
        if let Op::Transpose { parent: inner } = &graph.node(*parent).op {
            return same_op(graph, a, &graph.node(base_node(graph, *inner)).op);
        }
    }
    match (a, b) {
        (Op::Input { .. }, _) | (_, Op::Input { .. }) => false,
        (Op::Shared { var: v1 }, Op::Shared { var: v2 }) => v1.id == v2.id,
        (Op::SymIntValue { value: v1 }, Op::SymIntValue { value: v2 }) => v1 == v2,
        (
            Op::Value {
                value: v1,
                shape: s1,
                dtype: d1,
            },
            Op::Value {
                value: v2,
                shape: s2,
                dtype: d2,
            },
        ) => v1 == v2 && s1 == s2 && d1 == d2,
        (
            Op::Eye {
                size: n1,
                dtype: d1,
            },
            Op::Eye {
                size: n2,
                dtype: d2,
            },
        ) => n1 == n2 && d1 == d2,
        (
            Op::Sequence {
                start: a1,
                end: e1,
                dtype: d1,
            },
            Op::Sequence {
                start: a2,
                end: e2,
                dtype: d2,
            },
        ) => a1 == a2 && e1 == e2 && d1 == d2,
        (Op::MakeConstant { parent: p1 }, Op::MakeConstant { parent: p2 })
        | (Op::Neg { parent: p1 }, Op::Neg { parent: p2 })
        | (Op::Div { parent: p1 }, Op::Div { parent: p2 })
        | (Op::Square { parent: p1 }, Op::Square { parent: p2 })
        | (Op::Exp { parent: p1 }, Op::Exp { parent: p2 })
        | (Op::Log { parent: p1 }, Op::Log { parent: p2 })
        | (Op::Log10 { parent: p1 }, Op::Log10 { parent: p2 })
        | (Op::Log1p { parent: p1 }, Op::Log1p { parent: p2 })
        | (Op::Abs { parent: p1 }, Op::Abs { parent: p2 })
        | (Op::Sin { parent: p1 }, Op::Sin { parent: p2 })
        | (Op::Cos { parent: p1 }, Op::Cos { parent: p2 })
        | (Op::Tan { parent: p1 }, Op::Tan { parent: p2 })
        | (Op::Cot { parent: p1 }, Op::Cot { parent: p2 })
        | (Op::Sinh { parent: p1 }, Op::Sinh { parent: p2 })
        | (Op::Cosh { parent: p1 }, Op::Cosh { parent: p2 })
        | (Op::Tanh { parent: p1 }, Op::Tanh { parent: p2 })
        | (Op::Coth { parent: p1 }, Op::Coth { parent: p2 })
        | (Op::Not { parent: p1 }, Op::Not { parent: p2 })
        | (Op::IsNan { parent: p1 }, Op::IsNan { parent: p2 })
        | (Op::IsInf { parent: p1 }, Op::IsInf { parent: p2 })
        | (Op::All { parent: p1 }, Op::All { parent: p2 })
        | (Op::Any { parent: p1 }, Op::Any { parent: p2 })
        | (Op::Diagonal { parent: p1 }, Op::Diagonal { parent: p2 })
        | (Op::Transpose { parent: p1 }, Op::Transpose { parent: p2 })
        | (Op::MatInv { parent: p1 }, Op::MatInv { parent: p2 })
        | (Op::Det { parent: p1 }, Op::Det { parent: p2 })
        | (Op::LogDet { parent: p1 }, Op::LogDet { parent: p2 })
        | (Op::Trace { parent: p1 }, Op::Trace { parent: p2 }) => {
            symbolic_equals(graph, *p1, *p2)
        }
        (
            Op::Softplus {
                parent: p1,
                threshold: t1,
            },
            Op::Softplus {
                parent: p2,
                threshold: t2,
            },
        ) => t1 == t2 && symbolic_equals(graph, *p1, *p2),
        (
            Op::Cast {
                parent: p1,
                dtype: d1,
            },
            Op::Cast {
                parent: p2,
                dtype: d2,
            },
        ) => d1 == d2 && symbolic_equals(graph, *p1, *p2),
        (
            Op::Broadcast {
                parent: p1,
                to_shape: s1,
            },
            Op::Broadcast {
                parent: p2,
                to_shape: s2,
            },
        ) => s1 == s2 && symbolic_equals(graph, *p1, *p2),
        (Op::Add { parents: l }, Op::Add { parents: r })
        | (Op::Mul { parents: l }, Op::Mul { parents: r }) => multiset_equals(graph, l, r),
        (Op::MatMul { parents: l }, Op::MatMul { parents: r }) => ordered_equals(graph, l, r),
        (
            Op::Pow {
                parent1: a1,
                parent2: b1,
            },
            Op::Pow {
                parent1: a2,
                parent2: b2,
            },
        ) => ordered_equals(graph, &[*a1, *b1], &[*a2, *b2]),
        (
            Op::And {
                parent1: a1,
                parent2: b1,
            },
            Op::And {
                parent1: a2,
                parent2: b2,
            },
        )
        | (
            Op::Or {
                parent1: a1,
                parent2: b1,
            },
            Op::Or {
                parent1: a2,
                parent2: b2,
            },
        ) => multiset_equals(graph, &[*a1, *b1], &[*a2, *b2]),
        (
            Op::Cmp {
                kind: k1,
                parent1: a1,
                parent2: b1,
            },
            Op::Cmp {
                kind: k2,
                parent1: a2,
                parent2: b2,
            },
        ) => k1 == k2 && ordered_equals(graph, &[*a1, *b1], &[*a2, *b2]),
        (
            Op::ApproxEq {
                parent1: a1,
                parent2: b1,
                tol: t1,
            },
            Op::ApproxEq {
                parent1: a2,
                parent2: b2,
                tol: t2,
            },
        ) => t1 == t2 && ordered_equals(graph, &[*a1, *b1], &[*a2, *b2]),
        (
            Op::Select {
                condition: c1,
                parent1: a1,
                parent2: b1,
            },
            Op::Select {
                condition: c2,
                parent1: a2,
                parent2: b2,
            },
        ) => ordered_equals(graph, &[*c1, *a1, *b1], &[*c2, *a2, *b2]),
        (
            Op::Sum {
                parent: p1,
                axes: x1,
            },
            Op::Sum {
                parent: p2,
                axes: x2,
            },
        ) => x1 == x2 && symbolic_equals(graph, *p1, *p2),
        (
            Op::Reshape {
                parent: p1,
                shape: s1,
            },
            Op::Reshape {
                parent: p2,
                shape: s2,
            },
        ) => s1 == s2 && symbolic_equals(graph, *p1, *p2),
        (
            Op::Reorder {
                parent: p1,
                order: o1,
            },
            Op::Reorder {
                parent: p2,
                order: o2,
            },
        ) => o1 == o2 && symbolic_equals(graph, *p1, *p2),
        (
            Op::MaxAndArgMax {
                parent: p1,
                axis: x1,
            },
            Op::MaxAndArgMax {
                parent: p2,
                axis: x2,
            },
        )
        | (
            Op::SortAndArgSort {
                parent: p1,
                axis: x1,
            },
            Op::SortAndArgSort {
                parent: p2,
                axis: x2,
            },
        ) => x1 == x2 && symbolic_equals(graph, *p1, *p2),
        (
            Op::MultiIndex {
                parent: p1,
                index: i1,
            },
            Op::MultiIndex {
                parent: p2,
                index: i2,
            },
        ) => i1 == i2 && symbolic_equals(graph, *p1, *p2),
        (
            Op::Gather {
                parent: p1,
                indices: i1,
                axis: x1,
            },
            Op::Gather {
                parent: p2,
                indices: i2,
                axis: x2,
            },
        ) => x1 == x2 && symbolic_equals(graph, *p1, *p2) && symbolic_equals(graph, *i1, *i2),
        (
            Op::Scatter {
                parent: p1,
                indices: i1,
                axis: x1,
                result: r1,
            },
            Op::Scatter {
                parent: p2,
                indices: i2,
                axis: x2,
                result: r2,
            },
        ) => {
            x1 == x2
                && r1 == r2
                && symbolic_equals(graph, *p1, *p2)
                && symbolic_equals(graph, *i1, *i2)
        }
        (
            Op::BinaryCrossEntropyLogit {
                parent1: a1,
                parent2: b1,
                ..
            },
            Op::BinaryCrossEntropyLogit {
                parent1: a2,
                parent2: b2,
                ..
            },
        ) => ordered_equals(graph, &[*a1, *b1], &[*a2, *b2]),
        (Op::Alias { parent: p1 }, Op::Alias { parent: p2 }) => symbolic_equals(graph, *p1, *p2),
        _ => false,
    }
}
