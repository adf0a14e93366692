//! End-to-end checks on the evaluator's safety and resource guarantees,
//! plus totality of JSON inference.

use schemagen_core::introspect;
use schemagen_core::{evaluate, infer, EvalErrorKind, EvaluateOptions};
use serde_json::json;

fn kind_of(src: &str) -> EvalErrorKind {
    match evaluate(src, &EvaluateOptions::default()) {
        Ok(d) => panic!("`{}` evaluated to {:?}", src, d),
        Err(e) => e.kind(),
    }
}

#[test]
fn hostile_inputs_are_rejected_as_unsafe() {
    for src in [
        "process.exit(1)",
        "require('child_process')",
        "globalThis",
        "z.string().constructor",
        "z['string']()",
        "z.string().refine(v => fetch(v))",
        "z.string().refine(v => v.constructor.constructor('return 1')())",
        "z.string().refine(v => v['__proto__'])",
        "new Function('return 1')",
        "z.object({ a: eval('z.string()') })",
        "z.lazy(() => z.string())",
        "import('fs')",
    ] {
        assert_eq!(
            kind_of(src),
            EvalErrorKind::UnsafeOperation,
            "expected {} to be unsafe",
            src
        );
    }
}

#[test]
fn malformed_inputs_are_syntax_errors() {
    for src in [
        "",
        "z.string(",
        "z.object({ a: })",
        "z.string() z.number()",
        "x = z.string()",
        "`${z}`",
        "'abc",
        "42",
    ] {
        assert_eq!(
            kind_of(src),
            EvalErrorKind::Syntax,
            "expected {:?} to be a syntax error",
            src
        );
    }
}

#[test]
fn deep_nesting_hits_the_depth_ceiling() {
    let depth = 300;
    let src = format!("{}z.string(){}", "z.array(".repeat(depth), ")".repeat(depth));
    assert_eq!(kind_of(&src), EvalErrorKind::ComplexityExceeded);
}

#[test]
fn long_method_chains_hit_the_depth_ceiling() {
    let src = format!("z.string(){}", ".optional()".repeat(100_000));
    assert_eq!(kind_of(&src), EvalErrorKind::ComplexityExceeded);

    let src = format!("z.string(){}", ".optional()".repeat(20));
    let d = evaluate(&src, &EvaluateOptions::default()).expect("short chain evaluates");
    assert!(introspect::is_optional(&d));
}

#[test]
fn long_operator_runs_hit_the_depth_ceiling() {
    let body = vec!["v"; 50_000].join(" + ");
    let src = format!("z.string().refine(v => {})", body);
    assert_eq!(kind_of(&src), EvalErrorKind::ComplexityExceeded);

    let src = "z.string().refine(v => v.length + 1 > 2 && v !== 'x' || v === 'y')";
    assert!(evaluate(src, &EvaluateOptions::default()).is_ok());
}

#[test]
fn wide_schemas_hit_the_node_ceiling() {
    let fields: Vec<String> = (0..2_000).map(|i| format!("f{}: z.string()", i)).collect();
    let src = format!("z.object({{ {} }})", fields.join(", "));
    assert_eq!(kind_of(&src), EvalErrorKind::ComplexityExceeded);

    let relaxed = EvaluateOptions {
        max_nodes: 100_000,
        ..EvaluateOptions::default()
    };
    let d = evaluate(&src, &relaxed).expect("fits under a larger ceiling");
    assert_eq!(introspect::get_object_shape(&d).map(|s| s.len()), Some(2_000));
}

#[test]
fn inference_is_total() {
    for sample in [
        json!(null),
        json!(true),
        json!(-1.5),
        json!(""),
        json!([]),
        json!({}),
        json!([[], [[]], [1, [2]]]),
        json!({ "a": { "b": { "c": [null, { "d": 1 }] } } }),
    ] {
        let d = infer(&sample);
        assert!(!introspect::is_function(&d));
    }
}

#[test]
fn mixed_arrays_infer_unknown_elements() {
    let d = infer(&json!([1, "a", true]));
    let element = introspect::get_array_element(&d).expect("array");
    assert!(introspect::is_unknown(element));
}
