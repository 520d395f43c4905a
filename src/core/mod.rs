//! Core types of the symbolic tensor graph.
//!
//! This module contains the fundamental types:
//! - [`SymInt`] / [`Polynomial`] / [`Monomial`] — symbolic shape arithmetic
//! - [`Shape`] — tuples of four symbolic integers
//! - [`DType`] and the promotion rule
//! - [`Node`] / [`NodeId`] — arena records
//! - [`GraphError`] — error taxonomy
//! - the group tree

pub(crate) mod defs;
pub(crate) mod dtype;
pub(crate) mod error;
pub(crate) mod group;
pub(crate) mod node;
pub(crate) mod shape;
pub(crate) mod symbolic;

pub use defs::{Axes, Device, DeviceKind, GROUP_DELIMITER, GROUP_ROOT, MAX_SYM_VARIABLES, NodeKind, Policy, validate_axes};
pub use dtype::{DType, promote};
pub use error::{GraphError, Result};
pub use group::{GroupTree, NodeGroup};
pub use node::{ExecutionData, GroupId, Node, NodeId};
pub use shape::Shape;
pub use symbolic::{Monomial, Polynomial, SymInt, SymbolicError};
