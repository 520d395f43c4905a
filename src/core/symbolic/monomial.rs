//! Monomials: a signed coefficient times a product of variable powers.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Mul, Neg};

use super::{Assignment, SymbolicError, cmp_power_lists, superscript, variable_name};

/// A monomial `c · v₀^p₀ · v₁^p₁ · …`.
///
/// The `powers` list is kept sorted by variable id and never contains a zero
/// exponent. A monomial with an empty list is the constant `c`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Monomial {
    /// The constant coefficient.
    pub coefficient: i64,
    /// `(variable id, exponent)` pairs, sorted by id, exponents nonzero.
    pub powers: Vec<(u16, u16)>,
}

impl Monomial {
    /// The constant monomial `value`.
    pub fn constant(value: i64) -> Self {
        Monomial {
            coefficient: value,
            powers: Vec::new(),
        }
    }

    /// The monomial consisting of a single variable to the first power.
    pub fn variable(id: u16) -> Self {
        Monomial {
            coefficient: 1,
            powers: vec![(id, 1)],
        }
    }

    pub fn one() -> Self {
        Monomial::constant(1)
    }

    /// A monomial is constant when it mentions no variables.
    pub fn is_constant(&self) -> bool {
        self.powers.is_empty()
    }

    /// Two monomials are equal up to coefficient when their power lists match.
    pub fn up_to_coefficient(&self, other: &Monomial) -> bool {
        self.powers == other.powers
    }

    /// Evaluates the monomial under a complete variable assignment.
    pub fn eval(&self, values: &Assignment) -> Result<i64, SymbolicError> {
        let mut product = self.coefficient;
        for &(id, power) in &self.powers {
            let value = values
                .get(&id)
                .copied()
                .ok_or(SymbolicError::NonConstantEvaluation)?;
            product *= value.pow(u32::from(power));
        }
        Ok(product)
    }

    /// Evaluates a constant monomial; fails on anything with variables.
    pub fn eval_const(&self) -> Result<i64, SymbolicError> {
        if self.is_constant() {
            Ok(self.coefficient)
        } else {
            Err(SymbolicError::NonConstantEvaluation)
        }
    }

    /// Exact division. Fails whenever the quotient would have a fractional
    /// coefficient or a negative exponent.
    pub fn try_div(&self, rhs: &Monomial) -> Result<Monomial, SymbolicError> {
        if rhs.coefficient == 0 || self.coefficient % rhs.coefficient != 0 {
            return Err(SymbolicError::NonIntegerDivision);
        }
        let mut result = Monomial::constant(self.coefficient / rhs.coefficient);
        let mut i1 = 0;
        let mut i2 = 0;
        while i1 < self.powers.len() && i2 < rhs.powers.len() {
            let (v1, p1) = self.powers[i1];
            let (v2, p2) = rhs.powers[i2];
            if v1 < v2 {
                result.powers.push((v1, p1));
                i1 += 1;
            } else if v1 > v2 {
                return Err(SymbolicError::NonIntegerDivision);
            } else if p1 < p2 {
                return Err(SymbolicError::NonIntegerDivision);
            } else {
                if p1 > p2 {
                    result.powers.push((v1, p1 - p2));
                }
                i1 += 1;
                i2 += 1;
            }
        }
        if i2 < rhs.powers.len() {
            return Err(SymbolicError::NonIntegerDivision);
        }
        result.powers.extend_from_slice(&self.powers[i1..]);
        Ok(result)
    }

    /// Renders with explicit `*` between factors, suitable for generated code.
    pub fn to_code_string(&self) -> String {
        if self.coefficient == 0 {
            return "0".to_string();
        }
        let mut result = String::new();
        let mut first = true;
        if self.coefficient != 1 {
            if self.coefficient == -1 {
                result.push('-');
            } else {
                result.push_str(&self.coefficient.to_string());
                first = false;
            }
        }
        for &(id, power) in &self.powers {
            for _ in 0..power {
                if !first {
                    result.push('*');
                }
                result.push_str(&variable_name(id));
                first = false;
            }
        }
        if result.is_empty() { "1".to_string() } else { result }
    }
}

/// The total monomial order.
///
/// A monomial `m1` comes before `m2` (is `Less`) when:
/// 1. its lowest variable id is smaller, or
/// 2. ids match and its exponent for that variable is higher, or
/// 3. all shared positions match and it has more variables, or
/// 4. the power lists are identical and its coefficient is larger.
impl Ord for Monomial {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_power_lists(&self.powers, &other.powers)
            .then_with(|| other.coefficient.cmp(&self.coefficient))
    }
}

impl PartialOrd for Monomial {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Mul for &Monomial {
    type Output = Monomial;

    fn mul(self, rhs: &Monomial) -> Monomial {
        let mut result = Monomial::constant(self.coefficient * rhs.coefficient);
        let mut i1 = 0;
        let mut i2 = 0;
        while i1 < self.powers.len() && i2 < rhs.powers.len() {
            let (v1, p1) = self.powers[i1];
            let (v2, p2) = rhs.powers[i2];
            if v1 < v2 {
                result.powers.push((v1, p1));
                i1 += 1;
            } else if v1 > v2 {
                result.powers.push((v2, p2));
                i2 += 1;
            } else {
                result.powers.push((v1, p1 + p2));
                i1 += 1;
                i2 += 1;
            }
        }
        result.powers.extend_from_slice(&self.powers[i1..]);
        result.powers.extend_from_slice(&rhs.powers[i2..]);
        result
    }
}

impl Neg for &Monomial {
    type Output = Monomial;

    fn neg(self) -> Monomial {
        Monomial {
            coefficient: -self.coefficient,
            powers: self.powers.clone(),
        }
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coefficient == 0 {
            return write!(f, "0");
        }
        let mut result = String::new();
        if self.coefficient == -1 {
            result.push('-');
        } else if self.coefficient != 1 {
            result.push_str(&self.coefficient.to_string());
        }
        for &(id, power) in &self.powers {
            result.push_str(&variable_name(id));
            if power > 1 {
                result.push_str(&superscript(power));
            }
        }
        if result.is_empty() {
            result.push('1');
        }
        write!(f, "{}", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_prefers_lower_variable() {
        // x²y is before 100xy³⁰⁰, since x² <-> x.
        let m1 = &(&Monomial::variable(0) * &Monomial::variable(0)) * &Monomial::variable(1);
        let mut m2 = &Monomial::variable(0) * &Monomial::variable(1);
        m2.coefficient = 100;
        assert_eq!(m1.cmp(&m2), Ordering::Less);
    }

    #[test]
    fn mul_merges_powers() {
        let x = Monomial::variable(0);
        let xy = &x * &Monomial::variable(1);
        let x2y = &x * &xy;
        assert_eq!(x2y.powers, vec![(0, 2), (1, 1)]);
    }

    #[test]
    fn exact_division() {
        let x = Monomial::variable(0);
        let x2 = &x * &x;
        assert_eq!(x2.try_div(&x).expect("x²/x"), x);
        assert_eq!(
            x.try_div(&x2),
            Err(SymbolicError::NonIntegerDivision),
        );
        assert_eq!(
            Monomial::constant(5).try_div(&Monomial::constant(2)),
            Err(SymbolicError::NonIntegerDivision),
        );
    }

    #[test]
    fn eval_is_multiplicative() {
        let mut m = &Monomial::variable(0) * &Monomial::variable(1);
        m.coefficient = 3;
        let mut values = Assignment::default();
        values.insert(0, 2);
        values.insert(1, 5);
        assert_eq!(m.eval(&values).expect("assignment is complete"), 30);
    }

    #[test]
    fn display_forms() {
        let mut m = &Monomial::variable(0) * &Monomial::variable(0);
        m.coefficient = -2;
        assert_eq!(m.to_string(), "-2a²");
        assert_eq!(m.to_code_string(), "-2*a*a");
    }
}
