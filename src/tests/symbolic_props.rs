//! Property tests for the symbolic shape algebra: evaluation is a ring
//! homomorphism, division is exactly inverse to multiplication, and the
//! monomial order is total.

use quickcheck::{Arbitrary, Gen, quickcheck};
use rustc_hash::FxHashMap;

use crate::core::symbolic::{Monomial, Polynomial};

const MAX_VARIABLES: u16 = 3;

#[derive(Debug, Clone)]
struct SmallPoly(Polynomial);

#[derive(Debug, Clone)]
struct SmallMonomial(Monomial);

fn small_monomial(g: &mut Gen) -> Monomial {
    let coefficient = i64::arbitrary(g) % 4;
    let mut powers = Vec::new();
    for variable in 0..MAX_VARIABLES {
        let exponent = u16::arbitrary(g) % 3;
        if exponent > 0 {
            powers.push((variable, exponent));
        }
    }
    Monomial {
        coefficient,
        powers,
    }
}

impl Arbitrary for SmallMonomial {
    fn arbitrary(g: &mut Gen) -> Self {
        SmallMonomial(small_monomial(g))
    }
}

impl Arbitrary for SmallPoly {
    fn arbitrary(g: &mut Gen) -> Self {
        let terms = usize::arbitrary(g) % 4;
        let monomials = (0..terms).map(|_| small_monomial(g)).collect();
        SmallPoly(Polynomial::from_monomials(monomials))
    }
}

#[derive(Debug, Clone)]
struct SmallAssignment(FxHashMap<u16, i64>);

impl Arbitrary for SmallAssignment {
    fn arbitrary(g: &mut Gen) -> Self {
        let mut values = FxHashMap::default();
        for variable in 0..MAX_VARIABLES {
            values.insert(variable, i64::arbitrary(g) % 5);
        }
        SmallAssignment(values)
    }
}

quickcheck! {
    fn addition_commutes_with_evaluation(
        a: SmallPoly,
        b: SmallPoly,
        sigma: SmallAssignment
    ) -> bool {
        let sum = &a.0 + &b.0;
        sum.eval(&sigma.0).expect("assignment is complete")
            == a.0.eval(&sigma.0).expect("assignment is complete")
                + b.0.eval(&sigma.0).expect("assignment is complete")
    }

    fn multiplication_commutes_with_evaluation(
        a: SmallPoly,
        b: SmallPoly,
        sigma: SmallAssignment
    ) -> bool {
        let product = &a.0 * &b.0;
        product.eval(&sigma.0).expect("assignment is complete")
            == a.0.eval(&sigma.0).expect("assignment is complete")
                * b.0.eval(&sigma.0).expect("assignment is complete")
    }

    fn exact_division_inverts_multiplication(a: SmallPoly, b: SmallPoly) -> bool {
        if b.0.is_zero() {
            return true;
        }
        let product = &a.0 * &b.0;
        product.try_div(&b.0).expect("a·b is divisible by b") == a.0
    }

    fn division_result_reconstructs_dividend(a: SmallPoly, b: SmallPoly) -> bool {
        if b.0.is_zero() {
            return true;
        }
        match a.0.try_div(&b.0) {
            Ok(quotient) => &quotient * &b.0 == a.0,
            // Inexact division is allowed to fail; that is the contract.
            Err(_) => true,
        }
    }

    fn monomial_order_is_total_and_antisymmetric(
        a: SmallMonomial,
        b: SmallMonomial
    ) -> bool {
        let forward = a.0.cmp(&b.0);
        let backward = b.0.cmp(&a.0);
        forward == backward.reverse()
    }

    fn monomial_order_is_transitive(
        a: SmallMonomial,
        b: SmallMonomial,
        c: SmallMonomial
    ) -> bool {
        let mut sorted = vec![a.0.clone(), b.0.clone(), c.0.clone()];
        sorted.sort();
        sorted.windows(2).all(|w| w[0].cmp(&w[1]) != std::cmp::Ordering::Greater)
    }

    fn substitution_agrees_with_evaluation(a: SmallPoly, sigma: SmallAssignment) -> bool {
        let substituted = a.0.substitute(&sigma.0);
        substituted.is_constant()
            && substituted.eval_const().expect("fully substituted")
                == a.0.eval(&sigma.0).expect("assignment is complete")
    }
}

#[test]
fn addition_merges_sorted_lists() {
    let x = Polynomial::variable(0);
    let y = Polynomial::variable(1);
    let left = &(&x * &x) + &y;
    let right = &x + &(&y * &y);
    let sum = &left + &right;
    // Within one variable the higher power comes first.
    assert_eq!(sum.to_string(), "a²+a+b²+b");
}

#[test]
fn zero_has_no_monomials() {
    assert_eq!(Polynomial::zero().monomials().len(), 0);
    assert_eq!(Polynomial::zero().to_string(), "0");
    assert_eq!(Polynomial::from(0), Polynomial::zero());
}
