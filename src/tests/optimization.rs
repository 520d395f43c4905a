//! The rewrite passes: merging, folding, identity elimination, double
//! negation, scalar hoisting, hints, and the fixpoint property.

use super::test_graph;
use crate::ops::Op;
use crate::{DType, Graph, NodeId, SymInt};

fn active_ops(graph: &Graph, name: &str) -> Vec<NodeId> {
    graph
        .nodes()
        .filter(|n| n.active && n.op.name() == name)
        .map(|n| n.id)
        .collect()
}

#[test]
fn cse_leaves_a_single_add() {
    // z = (x + y)·(x + y), built with two separate additions.
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let y = g.scalar(DType::f32, "y");
    let first = g.add(&[x, y]).expect("add");
    let second = g.add(&[x, y]).expect("add");
    let z = g.mul(&[first, second]).expect("mul");

    let (optimized, outputs, _, _) = g.optimize(&[z], &[], &[x, y]).expect("optimize");
    assert_eq!(active_ops(&optimized, "Add").len(), 1);
    assert_eq!(active_ops(&optimized, "Alias").len(), 0);

    // The product now consumes the surviving addition twice.
    let Op::Mul { parents } = &optimized.node(outputs[0]).op else {
        panic!("expected the product as output");
    };
    assert_eq!(parents[0], parents[1]);
    optimized.check_invariants().expect("invariants hold");
}

#[test]
fn double_negation_vanishes() {
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let inner = g.neg(x).expect("neg");
    let z = g.neg(inner).expect("neg");

    let (optimized, outputs, _, inputs) = g.optimize(&[z], &[], &[x]).expect("optimize");
    assert_eq!(active_ops(&optimized, "Neg").len(), 0);
    // The output handle lands on the original input.
    assert_eq!(outputs[0], inputs[0]);
}

#[test]
fn scalars_are_hoisted_out_of_the_sum() {
    // sum(s1 · s2 · M) becomes s1 · s2 · sum(M).
    let mut g = test_graph();
    let registry = g.registry().clone();
    let s1 = g.shared_variable(registry.make("s1", [1, 1, 1, 1], DType::f32), "s1");
    let s2 = g.shared_variable(registry.make("s2", [1, 1, 1, 1], DType::f32), "s2");
    let m = g.shared_variable(registry.make("M", [2, 2, 1, 1], DType::f32), "M");
    let product = g.mul(&[s1, s2, m]).expect("mul");
    let total = g.sum_all(product).expect("sum");

    let (optimized, outputs, _, _) = g.optimize(&[total], &[], &[]).expect("optimize");
    let out = outputs[0];
    let Op::Mul { parents } = &optimized.node(out).op else {
        panic!("expected a scalar product as output");
    };
    assert_eq!(parents.len(), 3);
    let mut scalar_shared = 0;
    let mut sums = 0;
    for &p in parents {
        match &optimized.node(p).op {
            Op::Shared { .. } => scalar_shared += 1,
            Op::Sum { parent, .. } => {
                sums += 1;
                assert!(matches!(optimized.node(*parent).op, Op::Shared { .. }));
            }
            other => panic!("unexpected operand {}", other.name()),
        }
    }
    assert_eq!((scalar_shared, sums), (2, 1));
    optimized.check_invariants().expect("invariants hold");
}

#[test]
fn multiplication_by_one_is_eliminated() {
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let one = g.constant(1.0).expect("constant");
    let z = g.mul(&[one, x]).expect("mul");

    let (optimized, outputs, _, inputs) = g.optimize(&[z], &[], &[x]).expect("optimize");
    assert_eq!(active_ops(&optimized, "Mul").len(), 0);
    assert_eq!(outputs[0], inputs[0]);
}

#[test]
fn multiplication_by_minus_one_becomes_negation() {
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let minus_one = g.constant(-1.0).expect("constant");
    let z = g.mul(&[minus_one, x]).expect("mul");

    let (optimized, outputs, _, inputs) = g.optimize(&[z], &[], &[x]).expect("optimize");
    assert_eq!(active_ops(&optimized, "Mul").len(), 0);
    assert!(matches!(optimized.node(outputs[0]).op, Op::Neg { parent } if parent == inputs[0]));
}

#[test]
fn power_of_one_is_eliminated() {
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let one = g.constant(1.0).expect("constant");
    let z = g.pow(x, one).expect("pow");

    let (optimized, outputs, _, inputs) = g.optimize(&[z], &[], &[x]).expect("optimize");
    assert_eq!(active_ops(&optimized, "Pow").len(), 0);
    assert_eq!(outputs[0], inputs[0]);
}

#[test]
fn constants_fold_through_add_chains() {
    let mut g = test_graph();
    let two = g.constant(2.0).expect("constant");
    let three = g.constant(3.0).expect("constant");
    let five = g.add(&[two, three]).expect("add");
    let x = g.scalar(DType::f32, "x");
    let z = g.add(&[five, x]).expect("add");

    let (optimized, outputs, _, _) = g.optimize(&[z], &[], &[x]).expect("optimize");
    assert_eq!(active_ops(&optimized, "Add").len(), 1);
    let Op::Add { parents } = &optimized.node(outputs[0]).op else {
        panic!("expected the outer addition to survive");
    };
    let folded = parents
        .iter()
        .find_map(|&p| match optimized.node(p).op {
            Op::Value { value, .. } => Some(value),
            _ => None,
        })
        .expect("one operand folded to a constant");
    assert_eq!(folded, 5.0);
}

#[test]
fn optimize_reaches_a_fixpoint() {
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let y = g.scalar(DType::f32, "y");
    let a = g.add(&[x, y]).expect("add");
    let b = g.add(&[x, y]).expect("add");
    let inner = g.neg(a).expect("neg");
    let outer = g.neg(inner).expect("neg");
    let z = g.mul(&[outer, b]).expect("mul");

    let (first, outputs, _, inputs) = g.optimize(&[z], &[], &[x, y]).expect("first pass");
    let (second, outputs2, _, _) = first
        .optimize(&outputs, &[], &inputs)
        .expect("second pass");

    let live = |graph: &Graph| {
        graph
            .nodes()
            .filter(|n| n.active)
            .map(|n| n.op.name())
            .collect::<Vec<_>>()
    };
    assert_eq!(live(&first), live(&second));
    assert_eq!(outputs.len(), outputs2.len());
}

#[test]
fn no_live_duplicates_after_optimize() {
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let y = g.scalar(DType::f32, "y");
    let a = g.add(&[x, y]).expect("add");
    let b = g.mul(&[a, a]).expect("mul");
    let c = g.exp(b).expect("exp");
    let d = g.exp(b).expect("exp");
    let z = g.add(&[c, d]).expect("add");

    let (optimized, _, _, _) = g.optimize(&[z], &[], &[x, y]).expect("optimize");
    let live: Vec<NodeId> = optimized
        .nodes()
        .filter(|n| n.active && !n.op.parents().is_empty())
        .map(|n| n.id)
        .collect();
    for (i, &a) in live.iter().enumerate() {
        for &b in &live[i + 1..] {
            let duplicate = optimized.node(a).op.name() == optimized.node(b).op.name()
                && optimized.node(a).op.ancestors() == optimized.node(b).op.ancestors()
                && crate::ops::same_op(&optimized, &optimized.node(a).op, &optimized.node(b).op);
            assert!(!duplicate, "nodes {} and {} are structural duplicates", a, b);
        }
    }
}

#[test]
fn hints_mark_cheap_nodes_inlined() {
    let mut g = test_graph();
    let n = g.new_sym();
    let x = g.vector(DType::f32, n.clone(), "x");
    let y = g.vector(DType::f32, n, "y");
    let s = g.add(&[x, y]).expect("add");
    let t = g.tanh(s).expect("tanh");
    let u = g.exp(s).expect("exp");
    let z = g.mul(&[t, u]).expect("mul");

    let (optimized, outputs, _, inputs) = g.optimize(&[z], &[], &[x, y]).expect("optimize");
    for &input in &inputs {
        assert!(optimized.node(input).execution.inlined);
    }
    // The addition feeds two consumers, so it owns a buffer and a tag.
    let adds = active_ops(&optimized, "Add");
    assert_eq!(adds.len(), 1);
    assert!(!optimized.node(adds[0]).execution.inlined);
    assert!(optimized.node(adds[0]).execution.tag.is_some());
    // The single-consumer output chain is inlined.
    assert!(optimized.node(outputs[0]).execution.inlined);
}

#[test]
fn updates_are_remapped_through_optimize() {
    let mut g = test_graph();
    let registry = g.registry().clone();
    let w = g.shared_variable(registry.make("w", [2, 2, 1, 1], DType::f32), "w");
    let x = g.matrix(DType::f32, [SymInt::from(2), SymInt::from(2)], "x");
    let next = g.add(&[w, x]).expect("add");

    let (optimized, _, updates, inputs) = g
        .optimize(&[], &[(w, next)], &[x])
        .expect("optimize");
    assert_eq!(updates.len(), 1);
    let (shared, update) = updates[0];
    assert!(matches!(optimized.node(shared).op, Op::Shared { .. }));
    assert!(matches!(optimized.node(update).op, Op::Add { .. }));
    assert_eq!(optimized.node(update).shape, optimized.node(shared).shape);
    assert_eq!(inputs.len(), 1);
}
