//! Tensor shapes as tuples of four symbolic integers.

use std::fmt;

use super::symbolic::SymInt;

/// The shape of a tensor: `(d0, d1, d2, d3)`, each a symbolic integer.
///
/// A tensor is a scalar when all four are 1, a vector when `d1..d3` are 1,
/// a matrix when `d2, d3` are 1, and so on. Strict variants additionally
/// require the leading dimensions to differ from 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(pub [SymInt; 4]);

impl Shape {
    pub fn scalar() -> Self {
        Shape([SymInt::one(), SymInt::one(), SymInt::one(), SymInt::one()])
    }

    pub fn vector(d0: SymInt) -> Self {
        Shape([d0, SymInt::one(), SymInt::one(), SymInt::one()])
    }

    pub fn matrix(d0: SymInt, d1: SymInt) -> Self {
        Shape([d0, d1, SymInt::one(), SymInt::one()])
    }

    pub fn tensor3(d0: SymInt, d1: SymInt, d2: SymInt) -> Self {
        Shape([d0, d1, d2, SymInt::one()])
    }

    pub fn tensor4(d0: SymInt, d1: SymInt, d2: SymInt, d3: SymInt) -> Self {
        Shape([d0, d1, d2, d3])
    }

    /// The number of elements: `(d0·d1)·(d2·d3)`.
    pub fn elements(&self) -> SymInt {
        &(&self.0[0] * &self.0[1]) * &(&self.0[2] * &self.0[3])
    }

    pub fn is_scalar(&self) -> bool {
        self.0.iter().all(SymInt::is_one)
    }

    pub fn is_vector(&self) -> bool {
        self.0[1..].iter().all(SymInt::is_one)
    }

    pub fn is_vector_strict(&self) -> bool {
        !self.0[0].is_one() && self.0[1..].iter().all(SymInt::is_one)
    }

    pub fn is_matrix(&self) -> bool {
        self.0[2..].iter().all(SymInt::is_one)
    }

    pub fn is_matrix_strict(&self) -> bool {
        !self.0[0].is_one() && !self.0[1].is_one() && self.0[2..].iter().all(SymInt::is_one)
    }

    pub fn is_tensor3(&self) -> bool {
        self.0[3].is_one()
    }

    pub fn is_tensor3_strict(&self) -> bool {
        self.0[..3].iter().all(|d| !d.is_one()) && self.0[3].is_one()
    }

    pub fn is_tensor4_strict(&self) -> bool {
        self.0.iter().all(|d| !d.is_one())
    }

    pub fn is_square_matrix(&self) -> bool {
        self.is_matrix() && self.0[0] == self.0[1]
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

impl From<[i64; 4]> for Shape {
    fn from(dims: [i64; 4]) -> Self {
        Shape(dims.map(SymInt::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_count_is_symbolic() {
        let n = SymInt::variable(0);
        let m = SymInt::variable(1);
        let shape = Shape::matrix(n.clone(), m.clone());
        assert_eq!(shape.elements(), &n * &m);
    }

    #[test]
    fn classification() {
        let n = SymInt::variable(0);
        assert!(Shape::scalar().is_scalar());
        assert!(Shape::scalar().is_matrix());
        assert!(Shape::vector(n.clone()).is_vector());
        assert!(!Shape::vector(n.clone()).is_scalar());
        let m = Shape::matrix(n.clone(), SymInt::from(3));
        assert!(m.is_matrix() && !m.is_vector());
        assert!(m.is_matrix_strict() || m.0[0].is_one());
        assert!(Shape::matrix(n.clone(), n.clone()).is_square_matrix());
    }
}
