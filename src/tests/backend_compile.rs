//! The backend interface: compilation binds the schedule, the input
//! positions, the shared table and the updates.

use super::test_graph;
use crate::ops::Op;
use crate::{DType, GraphError, SymInt, compile};

#[test]
fn compile_binds_schedule_and_positions() {
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let y = g.scalar(DType::f32, "y");
    let s = g.add(&[x, y]).expect("add");
    let z = g.tanh(s).expect("tanh");

    let function = compile(&mut g, &[x, y], &[z], &[]).expect("compile");
    assert_eq!(function.outputs.len(), 1);
    assert_eq!(function.inputs.len(), 2);
    assert_eq!(function.steps.len(), function.graph.len());
    assert_eq!(function.input_positions.len(), 2);
    assert_eq!(function.input_positions[&function.inputs[0]], 0);
    assert_eq!(function.input_positions[&function.inputs[1]], 1);

    // Steps follow the arena in dependency order.
    for (position, step) in function.steps.iter().enumerate() {
        assert_eq!(step.id.0, position);
    }
}

#[test]
fn unreachable_input_is_reported() {
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let y = g.scalar(DType::f32, "y");
    let z = g.add(&[x, y]).expect("add");

    let err = compile(&mut g, &[x], &[z], &[]).expect_err("y is required");
    assert!(matches!(err, GraphError::MissingRequiredInput { .. }));
}

#[test]
fn updates_carry_over_to_the_compiled_function() {
    let mut g = test_graph();
    let registry = g.registry().clone();
    let w = g.shared_variable(registry.make("w", [4, 1, 1, 1], DType::f32), "w");
    let x = g.vector(DType::f32, SymInt::from(4), "x");
    let rate = g.constant(0.1f32).expect("constant");
    let step = g.mul(&[rate, x]).expect("mul");
    let next = g.sub(w, step).expect("sub");
    g.add_update(w, next).expect("update");

    let y = g.sum_all(x).expect("objective");
    let function = compile(&mut g, &[x], &[y], &[]).expect("compile");
    assert_eq!(function.updates.len(), 1);
    let (shared, update) = function.updates[0];
    assert!(matches!(function.graph.node(shared).op, Op::Shared { .. }));
    assert_eq!(
        function.graph.node(update).shape,
        function.graph.node(shared).shape
    );
    assert_eq!(function.shared.len(), 1);
    assert_eq!(function.shared[0].name, "w");
}

#[test]
fn update_validation_rejects_mismatches() {
    let mut g = test_graph();
    let registry = g.registry().clone();
    let w = g.shared_variable(registry.make("w", [4, 1, 1, 1], DType::f32), "w");
    let x = g.vector(DType::f32, SymInt::from(3), "x");
    assert!(matches!(
        g.add_update(w, x),
        Err(GraphError::IncompatibleShapes { .. })
    ));

    let wrong_dtype = g.vector(DType::f64, SymInt::from(4), "y");
    assert!(matches!(
        g.add_update(w, wrong_dtype),
        Err(GraphError::InvalidArguments { .. })
    ));

    let not_shared = g.vector(DType::f32, SymInt::from(4), "z");
    let other = g.vector(DType::f32, SymInt::from(4), "v");
    assert!(matches!(
        g.add_update(not_shared, other),
        Err(GraphError::InvalidArguments { .. })
    ));
}

#[test]
fn compiled_gradient_descent_step_end_to_end() {
    // One SGD step over a tiny linear model: w := w - r·∂loss/∂w.
    let mut g = test_graph();
    let registry = g.registry().clone();
    let batch = g.new_sym();
    let w = g.shared_variable(registry.make("w", [1, 4, 1, 1], DType::f32), "w");
    let x = g.matrix(DType::f32, [SymInt::from(4), batch], "x");
    let prediction = g.matmul(&[w, x]).expect("matmul");
    let squared = g.square(prediction).expect("square");
    let loss = g.sum_all(squared).expect("sum");

    let grads = g.gradient(loss, &[w]).expect("gradient");
    let rate = g.constant(0.01f32).expect("constant");
    let scaled = g.mul(&[rate, grads[0]]).expect("mul");
    let next = g.sub(w, scaled).expect("sub");

    let function = compile(&mut g, &[x], &[loss], &[(w, next)]).expect("compile");
    assert_eq!(function.updates.len(), 1);
    assert_eq!(function.outputs.len(), 1);
    function.graph.check_invariants().expect("compiled graph is sound");

    // Every non-inlined step owns a distinct schedule tag.
    let mut tags: Vec<usize> = function.steps.iter().filter_map(|s| s.tag).collect();
    tags.sort_unstable();
    tags.dedup();
    assert_eq!(
        tags.len(),
        function.steps.iter().filter(|s| !s.inlined).count()
    );
}

#[test]
fn visual_serialization_is_self_contained() {
    let mut g = test_graph();
    let x = g.scalar(DType::f32, "x");
    let y = g.scalar(DType::f32, "y");
    let s = g.add(&[x, y]).expect("add");
    let _z = g.exp(s).expect("exp");

    let path = std::env::temp_dir().join(format!("symb_tensor_visual_{}.html", std::process::id()));
    g.serialize_to_visual(&path).expect("serialize");
    let html = std::fs::read_to_string(&path).expect("read back");
    assert!(html.contains("var nodes = ["));
    assert!(html.contains("var edges = ["));
    assert!(html.contains("</html>"));
    // No external scripts or stylesheets.
    assert!(!html.contains("src=\"http"));
    assert!(!html.contains("href=\"http"));
    std::fs::remove_file(&path).expect("cleanup");
}
