//! Tensor data types and the promotion rule.

use std::fmt;

/// Data type of a node.
///
/// Width + signedness + kind; not every backend supports every width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum DType {
    /// 8 bit boolean
    b8,
    /// 8 bit unsigned integer
    u8,
    /// 16 bit unsigned integer
    u16,
    /// 32 bit unsigned integer
    u32,
    /// 64 bit unsigned integer
    u64,
    /// 8 bit signed integer
    i8,
    /// 16 bit signed integer
    i16,
    /// 32 bit signed integer
    i32,
    /// 64 bit signed integer
    i64,
    /// 8 bit floating point
    f8,
    /// 16 bit floating point
    f16,
    /// 32 bit floating point
    f32,
    /// 64 bit floating point
    f64,
}

impl DType {
    pub fn is_float(self) -> bool {
        matches!(self, DType::f8 | DType::f16 | DType::f32 | DType::f64)
    }

    pub fn is_signed_int(self) -> bool {
        matches!(self, DType::i8 | DType::i16 | DType::i32 | DType::i64)
    }

    pub fn is_unsigned_int(self) -> bool {
        matches!(self, DType::u8 | DType::u16 | DType::u32 | DType::u64)
    }

    pub fn is_int(self) -> bool {
        self.is_signed_int() || self.is_unsigned_int()
    }

    /// Bit width of the type.
    pub fn width(self) -> u16 {
        match self {
            DType::b8 | DType::u8 | DType::i8 | DType::f8 => 8,
            DType::u16 | DType::i16 | DType::f16 => 16,
            DType::u32 | DType::i32 | DType::f32 => 32,
            DType::u64 | DType::i64 | DType::f64 => 64,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::b8 => "b8",
            DType::u8 => "u8",
            DType::u16 => "u16",
            DType::u32 => "u32",
            DType::u64 => "u64",
            DType::i8 => "i8",
            DType::i16 => "i16",
            DType::i32 => "i32",
            DType::i64 => "i64",
            DType::f8 => "f8",
            DType::f16 => "f16",
            DType::f32 => "f32",
            DType::f64 => "f64",
        };
        write!(f, "{}", name)
    }
}

/// The default data type promotion, applied when two nodes of different
/// [`DType`] meet in an operator.
///
/// If either type is floating point the result is floating point, else if
/// either is an integer the result is an integer, else boolean. The precision
/// is the higher of the two operands, capped by `max_float` / `max_int`.
pub fn promote(type1: DType, type2: DType, max_float: DType, max_int: DType) -> DType {
    use DType::*;
    let either = |t: DType| type1 == t || type2 == t;
    if type1 == type2 {
        type1
    } else if either(f64) {
        max_float
    } else if either(f32) {
        if either(i64) && max_float == f64 {
            f64
        } else if max_float == f64 {
            f32
        } else {
            max_float
        }
    } else if either(f16) {
        if either(i64) && max_float == f64 {
            f64
        } else if either(i32) && (max_float == f64 || max_float == f32) {
            f32
        } else if max_float == f64 || max_float == f32 {
            f16
        } else {
            max_float
        }
    } else if either(f8) {
        if either(i64) && max_float == f64 {
            f64
        } else if either(i32) && (max_float == f64 || max_float == f32) {
            f32
        } else if either(i16) && max_float != f8 {
            f16
        } else {
            f8
        }
    } else if either(i64) {
        max_int
    } else if either(i32) {
        if max_int == i64 { i32 } else { max_int }
    } else if either(i16) {
        if max_int == i64 || max_int == i32 {
            i16
        } else {
            max_int
        }
    } else if either(i8) {
        i8
    } else if either(u64) {
        if max_int.width() >= 64 { u64 } else { max_int }
    } else if either(u32) {
        if max_int.width() >= 32 { u32 } else { max_int }
    } else if either(u16) {
        if max_int.width() >= 16 { u16 } else { max_int }
    } else if either(u8) {
        u8
    } else {
        b8
    }
}

#[cfg(test)]
mod tests {
    use super::DType::*;
    use super::*;

    #[test]
    fn equal_types_are_fixed() {
        assert_eq!(promote(f16, f16, f32, i32), f16);
        assert_eq!(promote(u32, u32, f32, i32), u32);
    }

    #[test]
    fn floats_dominate() {
        assert_eq!(promote(f64, i8, f32, i32), f32);
        assert_eq!(promote(f32, i64, f64, i64), f64);
        assert_eq!(promote(f16, i32, f64, i64), f32);
        assert_eq!(promote(b8, f32, f64, i32), f32);
    }

    #[test]
    fn integers_cap_at_max_int() {
        assert_eq!(promote(i64, i8, f32, i32), i32);
        assert_eq!(promote(i32, b8, f32, i64), i32);
        assert_eq!(promote(i16, u8, f32, i64), i16);
        assert_eq!(promote(u64, b8, f32, i32), i32);
    }
}
