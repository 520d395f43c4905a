#![forbid(unsafe_code)]
//! Symbolic Tensor Graphs
//!
//! A Rust library for building symbolic tensor computation graphs,
//! differentiating them with reverse-mode automatic differentiation, and
//! optimizing them for a native backend.
//!
//! # Features
//! - Symbolic shapes: dimensions are polynomials over abstract integer
//!   variables, so one graph serves any batch size
//! - A closed operator catalog with shape, dtype and kind inference
//! - Reverse-mode differentiation producing gradient nodes in the same graph
//! - Deterministic rewrite passes (merging, constant folding, algebraic
//!   identities, scalar hoisting) and a compacting arena
//! - A backend interface that hands over emission metadata instead of
//!   executing anything itself
//!
//! # Usage
//!
//! ```
//! use symb_tensor::{DType, Graph};
//!
//! let mut g = Graph::new();
//! let x = g.scalar(DType::f32, "x");
//! let y = g.scalar(DType::f32, "y");
//! let sum = g.add(&[x, y]).unwrap();
//! let z = g.mul(&[sum, sum]).unwrap();
//! let grads = g.gradient(z, &[x, y]).unwrap();
//! assert_eq!(grads.len(), 2);
//! let (optimized, outputs, _, _) = g.optimize(&[z], &[], &[x, y]).unwrap();
//! assert_eq!(outputs.len(), 1);
//! # drop(optimized);
//! ```

mod backend;
mod core;
mod diff;
mod graph;
mod ops;
mod optimize;
mod shared;
mod visual;

#[cfg(test)]
mod tests;

// Re-export key types from core
pub use core::{
    Axes, DType, Device, DeviceKind, ExecutionData, GraphError, GroupId, Monomial, Node, NodeId,
    NodeKind, Policy, Polynomial, Result, Shape, SymInt, SymbolicError, promote,
};

// The graph and its surfaces
pub use backend::{Backend, CompiledFunction, EmitStep, compile};
pub use graph::{Graph, Update};
pub use ops::{CmpKind, IntoConstant, Op};
pub use shared::{SharedRef, SharedRegistry, SharedVariable};

/// The maximum number of symbolic shape variables a graph may introduce.
pub use core::MAX_SYM_VARIABLES;
