//! Polynomials: sorted, merged lists of monomials.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use super::{Assignment, Monomial, SymbolicError};

/// A polynomial over abstract integer variables.
///
/// Invariants: the monomial list is sorted by the total monomial order, no
/// two monomials share a power list (like terms are merged), zero-coefficient
/// monomials never appear, and the empty list represents zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Polynomial {
    monomials: Vec<Monomial>,
}

impl Polynomial {
    pub fn zero() -> Self {
        Polynomial::default()
    }

    pub fn one() -> Self {
        Polynomial::from(1)
    }

    /// The polynomial consisting of a single variable.
    pub fn variable(id: u16) -> Self {
        Polynomial {
            monomials: vec![Monomial::variable(id)],
        }
    }

    /// Builds a polynomial from arbitrary monomials, restoring the
    /// sorted/merged/nonzero invariants.
    pub fn from_monomials(mut monomials: Vec<Monomial>) -> Self {
        monomials.sort();
        let mut merged: Vec<Monomial> = Vec::with_capacity(monomials.len());
        for m in monomials {
            match merged.last_mut() {
                Some(last) if last.up_to_coefficient(&m) => {
                    last.coefficient += m.coefficient;
                    if last.coefficient == 0 {
                        merged.pop();
                    }
                }
                _ => {
                    if m.coefficient != 0 {
                        merged.push(m);
                    }
                }
            }
        }
        Polynomial { monomials: merged }
    }

    /// The monomials, sorted by the total monomial order.
    pub fn monomials(&self) -> &[Monomial] {
        &self.monomials
    }

    pub fn is_zero(&self) -> bool {
        self.monomials.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.as_constant() == Some(1)
    }

    pub fn is_constant(&self) -> bool {
        match self.monomials.len() {
            0 => true,
            1 => self.monomials[0].is_constant(),
            _ => false,
        }
    }

    /// Returns the constant value, or `None` when variables are present.
    pub fn as_constant(&self) -> Option<i64> {
        match self.monomials.len() {
            0 => Some(0),
            1 if self.monomials[0].is_constant() => Some(self.monomials[0].coefficient),
            _ => None,
        }
    }

    /// Evaluates a constant polynomial; fails on anything with variables.
    pub fn eval_const(&self) -> Result<i64, SymbolicError> {
        self.as_constant().ok_or(SymbolicError::NonConstantEvaluation)
    }

    /// Evaluates the polynomial under a complete variable assignment.
    pub fn eval(&self, values: &Assignment) -> Result<i64, SymbolicError> {
        let mut sum = 0;
        for m in &self.monomials {
            sum += m.eval(values)?;
        }
        Ok(sum)
    }

    /// Substitutes the given variables with concrete integers, leaving the
    /// rest symbolic.
    pub fn substitute(&self, values: &Assignment) -> Polynomial {
        let mut result = Polynomial::zero();
        for m in &self.monomials {
            let mut coefficient = m.coefficient;
            let mut powers = Vec::new();
            for &(id, power) in &m.powers {
                match values.get(&id) {
                    Some(&value) => coefficient *= value.pow(u32::from(power)),
                    None => powers.push((id, power)),
                }
            }
            result = result + Polynomial::from_monomials(vec![Monomial { coefficient, powers }]);
        }
        result
    }

    /// Two polynomials are equal up to coefficients when they have the same
    /// power lists in the same order.
    pub fn up_to_coefficient(&self, other: &Polynomial) -> bool {
        self.monomials.len() == other.monomials.len()
            && self
                .monomials
                .iter()
                .zip(&other.monomials)
                .all(|(a, b)| a.up_to_coefficient(b))
    }

    /// Exact polynomial long division.
    ///
    /// Repeatedly divides the leading monomial of the remainder by the
    /// leading monomial of the divisor, failing with `NonIntegerDivision`
    /// whenever a step is not exact.
    pub fn try_div(&self, rhs: &Polynomial) -> Result<Polynomial, SymbolicError> {
        if rhs.is_zero() {
            return Err(SymbolicError::NonIntegerDivision);
        }
        let mut quotient = Polynomial::zero();
        let mut remainder = self.clone();
        while !remainder.is_zero() {
            let next = remainder.monomials[0].try_div(&rhs.monomials[0])?;
            let step = Polynomial {
                monomials: vec![next],
            };
            remainder = &remainder - &(rhs * &step);
            quotient = &quotient + &step;
        }
        Ok(quotient)
    }

    /// Renders with explicit `*` between factors, suitable for generated code.
    pub fn to_code_string(&self) -> String {
        if self.monomials.is_empty() {
            return "0".to_string();
        }
        let mut result = self.monomials[0].to_code_string();
        for m in &self.monomials[1..] {
            if m.coefficient > 0 {
                result.push('+');
            }
            result.push_str(&m.to_code_string());
        }
        result
    }
}

impl From<i64> for Polynomial {
    fn from(value: i64) -> Self {
        if value == 0 {
            Polynomial::zero()
        } else {
            Polynomial {
                monomials: vec![Monomial::constant(value)],
            }
        }
    }
}

impl From<Monomial> for Polynomial {
    fn from(monomial: Monomial) -> Self {
        Polynomial::from_monomials(vec![monomial])
    }
}

impl Add for &Polynomial {
    type Output = Polynomial;

    /// Merge over the two sorted monomial lists, combining like terms.
    fn add(self, rhs: &Polynomial) -> Polynomial {
        let mut result = Vec::with_capacity(self.monomials.len() + rhs.monomials.len());
        let mut i1 = 0;
        let mut i2 = 0;
        while i1 < self.monomials.len() && i2 < rhs.monomials.len() {
            let m1 = &self.monomials[i1];
            let m2 = &rhs.monomials[i2];
            if m1.up_to_coefficient(m2) {
                if m1.coefficient != -m2.coefficient {
                    let mut merged = m1.clone();
                    merged.coefficient += m2.coefficient;
                    result.push(merged);
                }
                i1 += 1;
                i2 += 1;
            } else if m1 < m2 {
                result.push(m1.clone());
                i1 += 1;
            } else {
                result.push(m2.clone());
                i2 += 1;
            }
        }
        result.extend_from_slice(&self.monomials[i1..]);
        result.extend_from_slice(&rhs.monomials[i2..]);
        Polynomial { monomials: result }
    }
}

impl Sub for &Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &Polynomial) -> Polynomial {
        self + &(-rhs)
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        Polynomial {
            monomials: self.monomials.iter().map(|m| -m).collect(),
        }
    }
}

impl Mul for &Polynomial {
    type Output = Polynomial;

    /// Cross product of monomials, merged through repeated addition.
    fn mul(self, rhs: &Polynomial) -> Polynomial {
        let mut result = Polynomial::zero();
        for m1 in &self.monomials {
            let partial = Polynomial {
                monomials: rhs.monomials.iter().map(|m2| m1 * m2).collect(),
            };
            result = &result + &Polynomial::from_monomials(partial.monomials);
        }
        result
    }
}

macro_rules! forward_owned_ops {
    ($($trait:ident :: $method:ident),*) => {$(
        impl $trait for Polynomial {
            type Output = Polynomial;
            fn $method(self, rhs: Polynomial) -> Polynomial {
                $trait::$method(&self, &rhs)
            }
        }
        impl $trait<&Polynomial> for Polynomial {
            type Output = Polynomial;
            fn $method(self, rhs: &Polynomial) -> Polynomial {
                $trait::$method(&self, rhs)
            }
        }
        impl $trait<i64> for &Polynomial {
            type Output = Polynomial;
            fn $method(self, rhs: i64) -> Polynomial {
                $trait::$method(self, &Polynomial::from(rhs))
            }
        }
        impl $trait<i64> for Polynomial {
            type Output = Polynomial;
            fn $method(self, rhs: i64) -> Polynomial {
                $trait::$method(&self, &Polynomial::from(rhs))
            }
        }
    )*};
}

forward_owned_ops!(Add::add, Sub::sub, Mul::mul);

impl Neg for Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        -&self
    }
}

impl PartialEq<i64> for Polynomial {
    fn eq(&self, other: &i64) -> bool {
        self.as_constant() == Some(*other)
    }
}

impl PartialOrd for Polynomial {
    /// Lexicographic comparison of the sorted monomial lists. Total on
    /// polynomials because the monomial order is total.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(
            self.monomials
                .iter()
                .zip(&other.monomials)
                .map(|(a, b)| a.cmp(b))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or_else(|| self.monomials.len().cmp(&other.monomials.len())),
        )
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.monomials.is_empty() {
            return write!(f, "0");
        }
        write!(f, "{}", self.monomials[0])?;
        for m in &self.monomials[1..] {
            if m.coefficient > 0 {
                write!(f, "+")?;
            }
            write!(f, "{}", m)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Polynomial {
        Polynomial::variable(0)
    }

    fn y() -> Polynomial {
        Polynomial::variable(1)
    }

    #[test]
    fn like_terms_merge() {
        let sum = &x() + &x();
        assert_eq!(sum.monomials().len(), 1);
        assert_eq!(sum.monomials()[0].coefficient, 2);
    }

    #[test]
    fn cancellation_yields_zero() {
        let zero = &x() - &x();
        assert!(zero.is_zero());
        assert_eq!(zero, Polynomial::zero());
    }

    #[test]
    fn product_expands() {
        // (x + y)(x - y) = x² - y²
        let p = &(&x() + &y()) * &(&x() - &y());
        assert_eq!(p.to_string(), "a²-b²");
    }

    #[test]
    fn exact_long_division() {
        // (x² + 2xy + y²) / (x + y) = x + y
        let s = &x() + &y();
        let square = &s * &s;
        assert_eq!(square.try_div(&s).expect("exact"), s);
    }

    #[test]
    fn inexact_division_fails() {
        let p = &x() + 1;
        assert_eq!(p.try_div(&y()), Err(SymbolicError::NonIntegerDivision));
        assert_eq!(
            Polynomial::from(7).try_div(&Polynomial::from(2)),
            Err(SymbolicError::NonIntegerDivision)
        );
    }

    #[test]
    fn constant_evaluation() {
        assert_eq!(Polynomial::from(5).eval_const().expect("constant"), 5);
        assert_eq!(x().eval_const(), Err(SymbolicError::NonConstantEvaluation));
    }

    #[test]
    fn substitution_is_partial() {
        let p = &(&x() * &y()) + 3;
        let mut values = Assignment::default();
        values.insert(0, 2);
        let substituted = p.substitute(&values);
        assert_eq!(substituted.to_string(), "2b+3");
    }
}
