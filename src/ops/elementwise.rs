//! Elementwise unary functions, the power operator, and composite builders.

use crate::core::error::Result;
use crate::core::NodeId;
use crate::graph::Graph;

use super::Op;

impl Graph {
    /// Elementwise square.
    pub fn square(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::Square { parent: node })
    }

    /// Elementwise exponential.
    pub fn exp(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::Exp { parent: node })
    }

    /// Elementwise natural logarithm.
    pub fn log(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::Log { parent: node })
    }

    /// Elementwise logarithm in base 10.
    pub fn log10(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::Log10 { parent: node })
    }

    /// Elementwise `log(1 + x)`.
    pub fn log1p(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::Log1p { parent: node })
    }

    /// Elementwise absolute value.
    pub fn abs(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::Abs { parent: node })
    }

    /// Elementwise softplus: `x` when `x > threshold`, else `log1p(exp(x))`.
    /// The threshold guards against overflow of the exponential.
    pub fn softplus(&mut self, node: NodeId, threshold: i64) -> Result<NodeId> {
        self.derived_node(Op::Softplus {
            parent: node,
            threshold,
        })
    }

    /// Elementwise logistic sigmoid, `1 / (1 + exp(-x))`.
    pub fn sigmoid(&mut self, node: NodeId) -> Result<NodeId> {
        let one = self.constant(1.0)?;
        let minus = self.neg(node)?;
        let exp = self.exp(minus)?;
        let denominator = self.add(&[one, exp])?;
        self.divide(one, denominator)
    }

    /// Elementwise rectifier, `0.5 * (x + |x|)`.
    pub fn relu(&mut self, node: NodeId) -> Result<NodeId> {
        let half = self.constant(0.5)?;
        let abs = self.abs(node)?;
        let sum = self.add(&[node, abs])?;
        self.mul(&[half, sum])
    }

    pub fn sin(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::Sin { parent: node })
    }

    pub fn cos(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::Cos { parent: node })
    }

    pub fn tan(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::Tan { parent: node })
    }

    pub fn cot(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::Cot { parent: node })
    }

    pub fn sinh(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::Sinh { parent: node })
    }

    pub fn cosh(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::Cosh { parent: node })
    }

    pub fn tanh(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::Tanh { parent: node })
    }

    pub fn coth(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::Coth { parent: node })
    }

    /// `base` raised to `exponent`, elementwise.
    pub fn pow(&mut self, base: NodeId, exponent: NodeId) -> Result<NodeId> {
        let parents = self.nary_elementwise("Pow", &[base, exponent])?;
        self.derived_node(Op::Pow {
            parent1: parents[0],
            parent2: parents[1],
        })
    }
}
