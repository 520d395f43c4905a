//! Shape inference, broadcast policies and dtype promotion at the graph
//! level.

use super::test_graph;
use crate::ops::{Op, same_op};
use crate::{DType, GraphError, Policy, Shape, SymInt};

#[test]
fn reshape_takes_the_requested_shape() {
    let mut g = test_graph();
    let n = g.new_sym();
    let m = g.new_sym();
    let x = g.matrix(DType::f32, [n.clone(), m.clone()], "x");
    let flat = Shape::vector(&n * &m);
    let r = g.reshape(x, flat.clone()).expect("reshape");
    assert_eq!(g.node(r).shape, flat);

    // Reshaping back restores the original shape.
    let back = g.reshape(r, g.node(x).shape.clone()).expect("reshape");
    assert_eq!(g.node(back).shape, g.node(x).shape);
}

#[test]
fn reshape_rejects_a_different_element_count() {
    let mut g = test_graph();
    let n = g.new_sym();
    let x = g.vector(DType::f32, n.clone(), "x");
    let bad = Shape::vector(&n + 1);
    let err = g.reshape(x, bad).expect_err("element count differs");
    assert!(matches!(err, GraphError::InvalidArguments { .. }));
}

#[test]
fn reorder_with_the_inverse_permutation_restores_the_shape() {
    let mut g = test_graph();
    let shape = [g.new_sym(), g.new_sym(), g.new_sym()];
    let x = g.tensor3(DType::f32, shape, "x");
    let permuted = g.reorder(x, &[2, 0, 1]).expect("reorder");
    let restored = g.reorder(permuted, &[1, 2, 0]).expect("inverse");
    assert_eq!(g.node(restored).shape, g.node(x).shape);
}

#[test]
fn transpose_of_transpose_is_structurally_the_base() {
    let mut g = test_graph();
    let n = g.new_sym();
    let m = g.new_sym();
    let x = g.matrix(DType::f32, [n, m], "x");
    let u = g.exp(x).expect("exp");
    let t = g.transpose(u).expect("transpose");
    let tt = g.transpose(t).expect("transpose");
    assert_eq!(g.node(tt).shape, g.node(u).shape);
    assert!(same_op(&g, &g.node(tt).op, &g.node(u).op));
}

#[test]
fn elementwise_shape_is_the_broadcast_maximum() {
    let mut g = test_graph();
    let n = g.new_sym();
    let m = g.new_sym();
    let a = g.matrix(DType::f32, [n.clone(), SymInt::one()], "a");
    let b = g.matrix(DType::f32, [SymInt::one(), m.clone()], "b");
    let s = g.add(&[a, b]).expect("two-sided broadcast");
    assert_eq!(g.node(s).shape, Shape::matrix(n, m));
}

#[test]
fn incompatible_shapes_are_rejected() {
    let mut g = test_graph();
    let n = g.new_sym();
    let m = g.new_sym();
    let a = g.vector(DType::f32, n, "a");
    let b = g.vector(DType::f32, m, "b");
    let err = g.add(&[a, b]).expect_err("disagreeing dimensions");
    assert!(matches!(err, GraphError::IncompatibleShapes { .. }));
}

#[test]
fn broadcast_policy_raise_turns_wrapping_into_an_error() {
    let mut g = test_graph();
    g.broadcast_policy = Policy::Raise;
    let n = g.new_sym();
    let m = g.new_sym();
    let a = g.matrix(DType::f32, [n.clone(), m], "a");
    let b = g.matrix(DType::f32, [n, SymInt::one()], "b");
    let before = g.len();
    let err = g.add(&[a, b]).expect_err("raise policy");
    assert!(matches!(err, GraphError::ImplicitBroadcast { .. }));
    // The failed factory left the arena unchanged.
    assert_eq!(g.len(), before);
}

#[test]
fn scalars_are_not_wrapped() {
    let mut g = test_graph();
    g.broadcast_policy = Policy::Raise;
    let n = g.new_sym();
    let a = g.vector(DType::f32, n, "a");
    let c = g.constant(3.0).expect("constant");
    // A scalar operand broadcasts implicitly even under Raise.
    let s = g.mul(&[c, a]).expect("scalar times vector");
    let Op::Mul { parents } = &g.node(s).op else {
        panic!("expected a product");
    };
    assert_eq!(parents, &vec![c, a]);
}

#[test]
fn dtype_promotion_follows_the_caps() {
    let mut g = test_graph();
    let x = g.scalar(DType::f64, "x");
    let y = g.scalar(DType::i64, "y");
    let s = g.add(&[x, y]).expect("add");
    // f64 + i64 caps at max_float = f32.
    assert_eq!(g.node(s).dtype, DType::f32);

    g.max_float = DType::f64;
    let t = g.mul(&[x, y]).expect("mul");
    assert_eq!(g.node(t).dtype, DType::f64);
}

#[test]
fn logical_operators_produce_booleans_and_cast_inputs() {
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let y = g.scalar(DType::f32, "y");
    let cmp = g.le(x, y).expect("le");
    assert_eq!(g.node(cmp).dtype, DType::b8);

    // `and` on floats casts both sides under the (quiet) cast policy.
    let conj = g.and(x, y).expect("and");
    let Op::And { parent1, parent2 } = g.node(conj).op else {
        panic!("expected a conjunction");
    };
    assert!(matches!(g.node(parent1).op, Op::Cast { dtype: DType::b8, .. }));
    assert!(matches!(g.node(parent2).op, Op::Cast { dtype: DType::b8, .. }));
}

#[test]
fn sum_validates_its_axes() {
    let mut g = test_graph();
    let n = g.new_sym();
    let x = g.vector(DType::f32, n, "x");
    assert!(g.sum(x, vec![0, 0]).is_err());
    assert!(g.sum(x, vec![4]).is_err());
    let s = g.sum(x, vec![0]).expect("sum");
    assert!(g.node(s).is_scalar());
}

#[test]
fn matmul_validates_the_chain() {
    let mut g = test_graph();
    let n = g.new_sym();
    let m = g.new_sym();
    let k = g.new_sym();
    let a = g.matrix(DType::f32, [n.clone(), m.clone()], "a");
    let b = g.matrix(DType::f32, [m.clone(), k.clone()], "b");
    let c = g.matrix(DType::f32, [n.clone(), k.clone()], "c");

    let product = g.matmul(&[a, b]).expect("matmul");
    assert_eq!(g.node(product).shape, Shape::matrix(n, k));

    let err = g.matmul(&[a, c]).expect_err("inner dimensions disagree");
    assert!(matches!(err, GraphError::IncompatibleShapes { .. }));
}

#[test]
fn diagonal_maps_between_vector_and_square_matrix() {
    let mut g = test_graph();
    let n = g.new_sym();
    let v = g.vector(DType::f32, n.clone(), "v");
    let d = g.diag(v).expect("diag");
    assert_eq!(g.node(d).shape, Shape::matrix(n.clone(), n.clone()));
    let back = g.diag(d).expect("diag");
    assert_eq!(g.node(back).shape, Shape::vector(n));
}

#[test]
fn cast_changes_only_the_dtype() {
    let mut g = test_graph();
    let n = g.new_sym();
    let x = g.vector(DType::f32, n, "x");
    let c = g.cast(x, DType::f64).expect("cast");
    assert_eq!(g.node(c).dtype, DType::f64);
    assert_eq!(g.node(c).shape, g.node(x).shape);
}
