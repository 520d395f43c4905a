//! Constant factories and the value-to-dtype selection under the graph's
//! precision caps.

use num_traits::ToPrimitive;

use crate::core::error::Result;
use crate::core::{DType, GraphError, NodeId, Shape, SymInt};
use crate::graph::Graph;

use super::Op;

/// A host value that can become a graph constant. The chosen dtype depends
/// on the value's own type and the graph's `max_float` / `max_int` caps.
pub trait IntoConstant: Copy {
    /// The dtype this value gets under the given caps.
    fn constant_dtype(max_float: DType, max_int: DType) -> DType;

    /// The value itself, widened for storage on the node.
    fn constant_value(self) -> f64;
}

impl IntoConstant for bool {
    fn constant_dtype(_max_float: DType, _max_int: DType) -> DType {
        DType::b8
    }

    fn constant_value(self) -> f64 {
        if self { 1.0 } else { 0.0 }
    }
}

macro_rules! impl_into_constant {
    ($($t:ty => |$max_float:pat_param, $max_int:pat_param| $dtype:expr;)*) => {$(
        impl IntoConstant for $t {
            fn constant_dtype($max_float: DType, $max_int: DType) -> DType {
                $dtype
            }

            fn constant_value(self) -> f64 {
                self.to_f64().unwrap_or(0.0)
            }
        }
    )*};
}

impl_into_constant! {
    u8 => |_, _| DType::u8;
    u16 => |_, max_int| match max_int {
        DType::i8 => DType::u8,
        _ => DType::u16,
    };
    u32 => |_, max_int| match max_int {
        DType::i8 => DType::u8,
        DType::i16 => DType::u16,
        _ => DType::u32,
    };
    u64 => |_, max_int| match max_int {
        DType::i8 => DType::u8,
        DType::i16 => DType::u16,
        DType::i32 => DType::u32,
        _ => DType::u64,
    };
    i8 => |_, _| DType::i8;
    i16 => |_, max_int| match max_int {
        DType::i8 => DType::i8,
        _ => DType::i16,
    };
    i32 => |_, max_int| match max_int {
        DType::i8 => DType::i8,
        DType::i16 => DType::i16,
        _ => DType::i32,
    };
    i64 => |_, max_int| match max_int {
        DType::i8 => DType::i8,
        DType::i16 => DType::i16,
        DType::i32 => DType::i32,
        _ => DType::i64,
    };
    f32 => |max_float, _| match max_float {
        DType::f8 => DType::f8,
        DType::f16 => DType::f16,
        _ => DType::f32,
    };
    f64 => |max_float, _| match max_float {
        DType::f8 => DType::f8,
        DType::f16 => DType::f16,
        DType::f32 => DType::f32,
        _ => DType::f64,
    };
}

impl Graph {
    /// A scalar constant; the dtype follows the value's type under the
    /// graph's precision caps.
    pub fn constant<T: IntoConstant>(&mut self, value: T) -> Result<NodeId> {
        self.constant_shaped(value, Shape::scalar())
    }

    /// A broadcasted constant of the given shape.
    pub fn constant_shaped<T: IntoConstant>(&mut self, value: T, shape: Shape) -> Result<NodeId> {
        let dtype = T::constant_dtype(self.max_float, self.max_int);
        self.derived_node(Op::Value {
            value: value.constant_value(),
            shape,
            dtype,
        })
    }

    /// A tensor of zeros at the maximum floating point precision.
    pub fn zeros(&mut self, shape: Shape) -> Result<NodeId> {
        let dtype = self.max_float;
        self.zeros_typed(shape, dtype)
    }

    pub fn zeros_typed(&mut self, shape: Shape, dtype: DType) -> Result<NodeId> {
        self.derived_node(Op::Value {
            value: 0.0,
            shape,
            dtype,
        })
    }

    /// A tensor of ones at the maximum floating point precision.
    pub fn ones(&mut self, shape: Shape) -> Result<NodeId> {
        let dtype = self.max_float;
        self.ones_typed(shape, dtype)
    }

    pub fn ones_typed(&mut self, shape: Shape, dtype: DType) -> Result<NodeId> {
        self.derived_node(Op::Value {
            value: 1.0,
            shape,
            dtype,
        })
    }

    /// The identity matrix of the given size, at the maximum floating point
    /// precision.
    pub fn eye(&mut self, size: SymInt) -> Result<NodeId> {
        let dtype = self.max_float;
        self.eye_typed(size, dtype)
    }

    pub fn eye_typed(&mut self, size: SymInt, dtype: DType) -> Result<NodeId> {
        self.derived_node(Op::Eye { size, dtype })
    }

    /// The vector `start..end-1`, at the maximum integer precision.
    pub fn seq(&mut self, start: SymInt, end: SymInt) -> Result<NodeId> {
        let dtype = self.max_int;
        self.seq_typed(start, end, dtype)
    }

    pub fn seq_typed(&mut self, start: SymInt, end: SymInt, dtype: DType) -> Result<NodeId> {
        self.derived_node(Op::Sequence { start, end, dtype })
    }

    /// Wraps a symbolic integer as a scalar node.
    pub fn wrap_sym(&mut self, value: SymInt) -> Result<NodeId> {
        self.derived_node(Op::SymIntValue { value })
    }

    /// A constant view of `node`; gradients never flow through it.
    pub fn make_constant(&mut self, node: NodeId) -> Result<NodeId> {
        self.derived_node(Op::MakeConstant { parent: node })
    }

    fn float_constant(&mut self, value: f64, what: &str) -> Result<NodeId> {
        match self.max_float {
            DType::f64 => self.constant(value),
            DType::f32 => self.constant(value as f32),
            _ => Err(GraphError::other(format!(
                "'{}' is not supported for max_float={}",
                what, self.max_float
            ))),
        }
    }

    /// π at the maximum allowed floating point precision.
    pub fn pi(&mut self) -> Result<NodeId> {
        self.float_constant(std::f64::consts::PI, "Pi")
    }

    /// Euler's number at the maximum allowed floating point precision.
    pub fn e(&mut self) -> Result<NodeId> {
        self.float_constant(std::f64::consts::E, "e")
    }

    /// ln(2) at the maximum allowed floating point precision.
    pub fn ln_2(&mut self) -> Result<NodeId> {
        self.float_constant(std::f64::consts::LN_2, "Ln(2)")
    }

    /// ln(10) at the maximum allowed floating point precision.
    pub fn ln_10(&mut self) -> Result<NodeId> {
        self.float_constant(std::f64::consts::LN_10, "Ln(10)")
    }
}
