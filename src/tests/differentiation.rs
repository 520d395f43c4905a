//! Differentiation: message propagation, accumulation, closed-form adjoints,
//! higher-order gradients and the error conditions.

use super::test_graph;
use crate::ops::Op;
use crate::{DType, GraphError, NodeKind, SymInt};

#[test]
fn gradient_of_the_objective_itself_is_the_seed() {
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let grads = g.gradient(x, &[x]).expect("gradient");
    assert_eq!(grads.len(), 1);
    assert!(matches!(g.node(grads[0]).op, Op::Value { value, .. } if value == 1.0));
    assert_eq!(g.node(grads[0]).grad_level, 1);
}

#[test]
fn unconnected_parameter_gets_a_zero_gradient() {
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let y = g.scalar(DType::f32, "y");
    let z = g.exp(x).expect("exp");
    let grads = g.gradient(z, &[x, y]).expect("gradient");
    assert!(matches!(g.node(grads[1]).op, Op::Value { value, .. } if value == 0.0));
    assert_eq!(g.node(grads[1]).shape, g.node(y).shape);
}

#[test]
fn messages_accumulate_per_occurrence() {
    // z = (x + y)·(x + y): the product sends one message per parent slot,
    // and the slots accumulate with Add.
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let y = g.scalar(DType::f32, "y");
    let s = g.add(&[x, y]).expect("add");
    let z = g.mul(&[s, s]).expect("mul");
    let grads = g.gradient(z, &[x, y]).expect("gradient");

    // dz/dx arrives as an Add of the two product messages.
    assert!(matches!(g.node(grads[0]).op, Op::Add { .. }));
    assert_eq!(g.node(grads[0]).grad_level, 1);
    assert_eq!(grads[0], grads[1]);
    g.check_invariants().expect("invariants hold");
}

#[test]
fn matmul_gradient_is_the_transposed_chain() {
    let mut g = test_graph();
    let n = g.new_sym();
    let m = g.new_sym();
    let a = g.matrix(DType::f32, [n.clone(), m.clone()], "A");
    let x = g.matrix(DType::f32, [m.clone(), SymInt::one()], "x");
    let product = g.matmul(&[a, x]).expect("matmul");
    let objective = g.sum_all(product).expect("sum");
    let grads = g.gradient(objective, &[x]).expect("gradient");

    // d(Ax)/dx · msg = Aᵀ · msg
    let Op::MatMul { parents } = &g.node(grads[0]).op else {
        panic!("expected a matrix product, got {}", g.node(grads[0]).op.name());
    };
    assert_eq!(parents.len(), 2);
    assert!(matches!(g.node(parents[0]).op, Op::Transpose { parent } if parent == a));
    assert_eq!(g.node(grads[0]).shape, g.node(x).shape);
}

#[test]
fn broadcast_gradient_sums_the_replicated_axes() {
    let mut g = test_graph();
    let n = g.new_sym();
    let m = g.new_sym();
    let a = g.matrix(DType::f32, [n.clone(), m.clone()], "A");
    let b = g.matrix(DType::f32, [n.clone(), SymInt::one()], "b");
    let s = g.add(&[a, b]).expect("add broadcasts b");
    let objective = g.sum_all(s).expect("sum");
    let grads = g.gradient(objective, &[b]).expect("gradient");
    assert_eq!(g.node(grads[0]).shape, g.node(b).shape);
    assert!(matches!(g.node(grads[0]).op, Op::Sum { ref axes, .. } if axes == &vec![1]));
}

#[test]
fn gradient_nodes_live_in_the_gradients_group() {
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let z = g.square(x).expect("square");
    let grads = g.gradient(z, &[x]).expect("gradient");
    let group = g.groups().get(g.node(grads[0]).group).full_name.clone();
    assert!(
        group.starts_with("Gradients 1"),
        "gradient node placed in group '{}'",
        group
    );
    // The surrounding group is restored afterwards.
    assert_eq!(g.current_group(), crate::GroupId(0));
}

#[test]
fn higher_order_gradients_climb_the_level() {
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let z = g.mul(&[x, x]).expect("mul");
    let first = g.gradient(z, &[x]).expect("first order")[0];
    assert_eq!(g.node(first).grad_level, 1);

    let second = g.gradient(first, &[x]).expect("second order")[0];
    assert_eq!(g.node(second).grad_level, 2);
    g.check_invariants().expect("still a DAG in dependency order");
}

#[test]
fn non_scalar_objective_is_rejected_without_mutation() {
    let mut g = test_graph();
    let n = g.new_sym();
    let v = g.vector(DType::f32, n, "v");
    let z = g.exp(v).expect("exp");
    let before = g.len();
    let err = g.gradient(z, &[v]).expect_err("vector objective");
    assert!(matches!(err, GraphError::UnsupportedGradient { node, .. } if node == z));
    assert_eq!(g.len(), before);
}

#[test]
fn logical_results_poison_gradient_flow() {
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let y = g.scalar(DType::f32, "y");
    let gt = g.gt(x, y).expect("gt");
    let z = g.all(gt).expect("all");
    assert_eq!(g.node(z).kind, NodeKind::ConstantDerived);
    let err = g.gradient(z, &[x]).expect_err("no gradient through logicals");
    assert!(matches!(err, GraphError::WrongGradient { .. }));
}

#[test]
fn make_constant_blocks_the_message() {
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let y = g.scalar(DType::f32, "y");
    let frozen = g.make_constant(y).expect("make_constant");
    let z = g.mul(&[x, frozen]).expect("mul");
    let grads = g.gradient(z, &[x, y]).expect("gradient");
    // x still gets its factor, y gets a structural zero.
    assert!(matches!(g.node(grads[1]).op, Op::Value { value, .. } if value == 0.0));
    assert_ne!(grads[0], grads[1]);
}

#[test]
fn select_routes_the_message_through_the_taken_branch() {
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let y = g.scalar(DType::f32, "y");
    let zero = g.constant(0.0).expect("constant");
    let cond = g.gt(x, zero).expect("gt");
    let chosen = g.select(cond, x, y).expect("select");
    let grads = g.gradient(chosen, &[x, y]).expect("gradient");
    assert!(matches!(g.node(grads[0]).op, Op::Select { .. }));
    assert!(matches!(g.node(grads[1]).op, Op::Select { .. }));
}

#[test]
fn argmax_values_scatter_their_gradient() {
    let mut g = test_graph();
    let n = g.new_sym();
    let m = g.new_sym();
    let a = g.matrix(DType::f32, [n, m], "A");
    let (max, argmax) = g.max_and_argmax(a, 0).expect("max");
    let objective = g.sum_all(max).expect("sum");
    let grads = g.gradient(objective, &[a]).expect("gradient");

    // The message is scattered back into the winning positions.
    let scatter = grads[0];
    assert!(matches!(g.node(scatter).op, Op::Scatter { axis: 0, .. }));
    assert_eq!(g.node(scatter).shape, g.node(a).shape);
    let Op::Scatter { indices, .. } = g.node(scatter).op else {
        unreachable!();
    };
    assert_eq!(indices, argmax);

    // The positions themselves are not differentiable.
    let objective2 = g.sum_all(argmax).expect("sum");
    let err = g.gradient(objective2, &[a]).expect_err("argmax grad");
    assert!(matches!(err, GraphError::WrongGradient { .. }));
}

#[test]
fn bce_logit_reuses_its_softplus_arguments() {
    let mut g = test_graph();
    let n = g.new_sym();
    let m = g.new_sym();
    let p = g.matrix(DType::f32, [n.clone(), m.clone()], "p");
    let x = g.matrix(DType::f32, [n, m], "x");
    let loss = g.binary_cross_entropy_logit(p, x).expect("bce");
    let objective = g.sum_all(loss).expect("sum");

    let Op::BinaryCrossEntropyLogit {
        softplus_x,
        softplus_mx,
        ..
    } = g.node(loss).op
    else {
        panic!("expected the fused loss");
    };
    assert!(matches!(g.node(softplus_x).op, Op::Softplus { .. }));
    assert!(matches!(g.node(softplus_mx).op, Op::Softplus { .. }));

    let grads = g.gradient(objective, &[x]).expect("gradient");
    assert_eq!(g.node(grads[0]).shape, g.node(x).shape);
    assert_eq!(g.node(grads[0]).grad_level, 1);
}

#[test]
fn eight_layer_autoencoder_has_a_gradient_per_parameter() {
    let mut g = test_graph();
    let batch = g.new_sym();
    let sizes = [784usize, 512, 256, 128, 64, 128, 256, 512, 784];
    let x = g.matrix(DType::f32, [SymInt::from(784), batch.clone()], "data");

    let mut params = Vec::new();
    let mut hidden = x;
    for layer in 0..8 {
        let rows = SymInt::from(sizes[layer + 1] as i64);
        let cols = SymInt::from(sizes[layer] as i64);
        let w = g.matrix(DType::f32, [rows.clone(), cols], &format!("W{}", layer + 1));
        let b = g.matrix(DType::f32, [rows, SymInt::one()], &format!("b{}", layer + 1));
        params.push(w);
        params.push(b);
        let product = g.matmul(&[w, hidden]).expect("matmul");
        let affine = g.add(&[product, b]).expect("add");
        hidden = g.tanh(affine).expect("tanh");
    }

    let loss = g.binary_cross_entropy_logit(x, hidden).expect("bce");
    let objective = g.sum_all(loss).expect("sum");
    let grads = g.gradient(objective, &params).expect("gradient");

    assert_eq!(grads.len(), 16);
    for (grad, param) in grads.iter().zip(&params) {
        assert_eq!(g.node(*grad).grad_level, 1);
        assert_eq!(g.node(*grad).shape, g.node(*param).shape);
    }
    g.check_invariants().expect("invariants hold");
}
