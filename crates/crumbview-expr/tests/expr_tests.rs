//! Integration tests for the expression evaluator and template resolver.
//!
//! Covers:
//! - literals and path lookups
//! - equality / inequality
//! - calc() arithmetic and its soft failure
//! - typed vs. interpolated template resolution

use crumbview_expr::{evaluate, resolve, resolve_str, try_calc, ExprError};
use crumbview_types::{Context, Value};
use serde_json::json;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn ctx(json: serde_json::Value) -> Context {
    Context::from_value(Value::from(json))
}

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

// ══════════════════════════════════════════════════════════════════════════════
// Literals
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn literal_true_false_null_undefined() {
    let c = ctx(json!({"true": "shadowed?"}));
    assert_eq!(evaluate("true", &c), Value::Bool(true));
    assert_eq!(evaluate("false", &c), Value::Bool(false));
    assert_eq!(evaluate("null", &c), Value::Null);
    assert_eq!(evaluate("undefined", &c), Value::Undefined);
}

#[test]
fn literal_numbers() {
    let c = Context::new();
    assert_eq!(evaluate("42", &c), Value::Number(42.0));
    assert_eq!(evaluate("-7", &c), Value::Number(-7.0));
    assert_eq!(evaluate("3.5", &c), Value::Number(3.5));
}

#[test]
fn literal_strings_single_and_double_quoted() {
    let c = Context::new();
    assert_eq!(evaluate("'x'", &c), Value::from("x"));
    assert_eq!(evaluate("\"hello world\"", &c), Value::from("hello world"));
    assert_eq!(evaluate("''", &c), Value::from(""));
}

#[test]
fn surrounding_whitespace_is_ignored() {
    let c = ctx(json!({"a": 1}));
    assert_eq!(evaluate("  a  ", &c), Value::Number(1.0));
    assert_eq!(evaluate(" true ", &c), Value::Bool(true));
}

// ══════════════════════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn path_with_bracket_index() {
    let c = ctx(json!({"a": {"b": [10, 20]}}));
    assert_eq!(evaluate("a.b[1]", &c), Value::Number(20.0));
    assert_eq!(evaluate("a.b[0]", &c), Value::Number(10.0));
}

#[test]
fn path_through_null_parent_is_undefined() {
    let c = ctx(json!({"a": null}));
    assert_eq!(evaluate("a.b", &c), Value::Undefined);
    assert_eq!(evaluate("a.b.c.d", &c), Value::Undefined);
}

#[test]
fn path_missing_segment_is_undefined() {
    let c = ctx(json!({"a": {"b": 1}}));
    assert_eq!(evaluate("a.c", &c), Value::Undefined);
    assert_eq!(evaluate("missing", &c), Value::Undefined);
    assert_eq!(evaluate("a.b[3]", &c), Value::Undefined);
}

#[test]
fn path_returns_typed_structures() {
    let c = ctx(json!({"catalog": [{"context": {"models": ["m1", "m2"]}}]}));
    assert_eq!(
        evaluate("catalog[0].context.models", &c),
        v(json!(["m1", "m2"]))
    );
}

#[test]
fn path_reads_explicit_null() {
    let c = ctx(json!({"a": {"b": null}}));
    assert_eq!(evaluate("a.b", &c), Value::Null);
}

#[test]
fn evaluation_does_not_mutate_context() {
    let c = ctx(json!({"state": {"n": 1}}));
    let before = c.to_value();
    let _ = evaluate("calc(state.n + 1)", &c);
    let _ = evaluate("state.n === 1", &c);
    assert_eq!(c.to_value(), before);
}

// ══════════════════════════════════════════════════════════════════════════════
// Equality
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn strict_equality_on_paths_and_literals() {
    let c = ctx(json!({"state": {"tab": "home", "count": 3}}));
    assert_eq!(evaluate("state.tab === 'home'", &c), Value::Bool(true));
    assert_eq!(evaluate("state.tab === 'settings'", &c), Value::Bool(false));
    assert_eq!(evaluate("state.count === 3", &c), Value::Bool(true));
    assert_eq!(evaluate("state.count !== 3", &c), Value::Bool(false));
    assert_eq!(evaluate("state.tab !== 'x'", &c), Value::Bool(true));
}

#[test]
fn equality_distinguishes_null_and_undefined() {
    let c = ctx(json!({"a": null}));
    assert_eq!(evaluate("a === null", &c), Value::Bool(true));
    assert_eq!(evaluate("a === undefined", &c), Value::Bool(false));
    assert_eq!(evaluate("missing === undefined", &c), Value::Bool(true));
}

#[test]
fn equality_compares_structures_by_value() {
    let c = ctx(json!({"x": [1, 2], "y": [1, 2]}));
    assert_eq!(evaluate("x === y", &c), Value::Bool(true));
}

#[test]
fn equality_does_not_coerce_types() {
    let c = ctx(json!({"n": 1}));
    assert_eq!(evaluate("n === '1'", &c), Value::Bool(false));
}

#[test]
fn long_equality_chain_terminates() {
    let c = ctx(json!({"x": true}));
    let chain = vec!["x"; 20_000].join(" === ");
    assert_eq!(evaluate(&chain, &c), Value::Bool(true));
    assert_eq!(
        resolve_str(&format!("{{{{{chain}}}}}"), &c),
        Value::Bool(true)
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// calc()
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn calc_substitutes_context_paths() {
    let c = ctx(json!({"state": {"count": 4}, "items": [{"price": 2.5}]}));
    assert_eq!(evaluate("calc(state.count * 2)", &c), Value::Number(8.0));
    assert_eq!(
        evaluate("calc(items[0].price + state.count)", &c),
        Value::Number(6.5)
    );
}

#[test]
fn calc_parses_numeric_strings_and_booleans() {
    let c = ctx(json!({"s": "10", "flag": true}));
    assert_eq!(evaluate("calc(s / 4)", &c), Value::Number(2.5));
    assert_eq!(evaluate("calc(flag + 1)", &c), Value::Number(2.0));
}

#[test]
fn calc_with_index_from_iteration() {
    let c = ctx(json!({"index": 2}));
    assert_eq!(evaluate("calc(index + 1)", &c), Value::Number(3.0));
}

#[test]
fn calc_failure_yields_zero() {
    let c = ctx(json!({"name": "alice"}));
    assert_eq!(evaluate("calc(unknown + 1)", &c), Value::Number(0.0));
    assert_eq!(evaluate("calc(name * 2)", &c), Value::Number(0.0));
    assert_eq!(evaluate("calc(1 +)", &c), Value::Number(0.0));
    assert_eq!(evaluate("calc(1 / 0)", &c), Value::Number(0.0));
    assert_eq!(evaluate("calc(alert(1); 2)", &c), Value::Number(0.0));
}

#[test]
fn try_calc_reports_reason() {
    let c = ctx(json!({"name": "alice"}));
    assert_eq!(
        try_calc("name * 2", &c),
        Err(ExprError::NonNumeric("alice".into()))
    );
    assert_eq!(
        try_calc("missing", &c),
        Err(ExprError::NonNumeric("missing".into()))
    );
    assert!(matches!(
        try_calc("1 % 0", &c),
        Err(ExprError::ArithmeticTrap(_))
    ));
}

#[test]
fn calc_inside_equality() {
    let c = ctx(json!({"n": 2}));
    assert_eq!(evaluate("calc(n * 2) === 4", &c), Value::Bool(true));
}

// ══════════════════════════════════════════════════════════════════════════════
// Template resolution
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn literal_strings_pass_through() {
    let c = ctx(json!({"a": 1}));
    for s in ["", "plain text", "{ not a template }", "{{ unterminated", "}} {{"] {
        assert_eq!(resolve_str(s, &c), Value::from(s));
    }
}

#[test]
fn whole_string_expression_keeps_type() {
    let c = ctx(json!({"a": {"b": [1, 2]}}));
    assert_eq!(resolve_str("{{a.b}}", &c), v(json!([1, 2])));
    assert_eq!(resolve_str("{{ a.b[0] }}", &c), Value::Number(1.0));
}

#[test]
fn mixed_string_interpolates() {
    let c = ctx(json!({"a": {"b": 5}}));
    assert_eq!(resolve_str("x={{a.b}}", &c), Value::from("x=5"));
}

#[test]
fn multiple_expressions_interpolate() {
    let c = ctx(json!({"item": "a", "index": 0}));
    assert_eq!(resolve_str("{{item}}-{{index}}", &c), Value::from("a-0"));
}

#[test]
fn nullish_interpolates_as_empty() {
    let c = ctx(json!({"a": null}));
    assert_eq!(resolve_str("[{{a}}][{{missing}}]", &c), Value::from("[][]"));
}

#[test]
fn whole_string_missing_path_is_undefined() {
    let c = Context::new();
    assert_eq!(resolve_str("{{missing}}", &c), Value::Undefined);
}

#[test]
fn resolve_walks_nested_structures() {
    let c = ctx(json!({"user": {"name": "Ada", "age": 36}}));
    let template = v(json!({
        "title": "Hello {{user.name}}",
        "age": "{{user.age}}",
        "tags": ["{{user.name}}", 3, null, true],
        "nested": {"deep": ["{{calc(user.age + 1)}}"]}
    }));
    assert_eq!(
        resolve(&template, &c),
        v(json!({
            "title": "Hello Ada",
            "age": 36,
            "tags": ["Ada", 3, null, true],
            "nested": {"deep": [37]}
        }))
    );
}

#[test]
fn resolve_passes_non_string_scalars() {
    let c = Context::new();
    assert_eq!(resolve(&Value::Number(1.5), &c), Value::Number(1.5));
    assert_eq!(resolve(&Value::Null, &c), Value::Null);
    assert_eq!(resolve(&Value::Undefined, &c), Value::Undefined);
    assert_eq!(resolve(&Value::Bool(false), &c), Value::Bool(false));
}

#[test]
fn interpolated_structures_render_as_json() {
    let c = ctx(json!({"xs": [1, 2]}));
    assert_eq!(resolve_str("xs={{xs}}", &c), Value::from("xs=[1,2]"));
}
