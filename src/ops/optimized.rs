//! Fused operators that pre-compute parts of their own gradient.

use crate::core::error::Result;
use crate::core::NodeId;
use crate::graph::Graph;

use super::Op;

/// Softplus saturates to the identity beyond this point.
pub(crate) const SOFTPLUS_THRESHOLD: i64 = 50;

impl Graph {
    /// Binary cross-entropy between `p` and `sigmoid(x)`:
    /// `f = -p·log(q) - (1-p)·log(1-q)` with `q = sigmoid(x)`.
    ///
    /// Since `log(q) = -softplus(-x)` and `log(1-q) = -softplus(x)`, the node
    /// keeps `softplus(x)` and `softplus(-x)` as arguments so the gradient
    /// does not recompute them.
    pub fn binary_cross_entropy_logit(&mut self, p: NodeId, x: NodeId) -> Result<NodeId> {
        let parents = self.nary_elementwise("BinCrossEntropyLogit", &[p, x])?;
        let (p, x) = (parents[0], parents[1]);
        let softplus_x = self.softplus(x, SOFTPLUS_THRESHOLD)?;
        let minus_x = self.neg(x)?;
        let softplus_mx = self.softplus(minus_x, SOFTPLUS_THRESHOLD)?;
        self.derived_node(Op::BinaryCrossEntropyLogit {
            parent1: p,
            parent2: x,
            softplus_x,
            softplus_mx,
        })
    }
}
