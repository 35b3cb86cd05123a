//! Template resolution over arbitrary values.

use crate::evaluator::evaluate;
use crumbview_types::{Context, Value};
use std::collections::BTreeMap;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A piece of a template string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part<'a> {
    Literal(&'a str),
    /// Expression text between `{{` and `}}`, untrimmed.
    Expr(&'a str),
}

/// Split a string into literal text and `{{...}}` expressions. An
/// unterminated `{{` is literal text.
pub fn parse_template(s: &str) -> Vec<Part<'_>> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(open) = rest.find(OPEN) {
        let after_open = &rest[open + OPEN.len()..];
        let Some(close) = after_open.find(CLOSE) else {
            break;
        };
        if open > 0 {
            parts.push(Part::Literal(&rest[..open]));
        }
        parts.push(Part::Expr(&after_open[..close]));
        rest = &after_open[close + CLOSE.len()..];
    }
    if !rest.is_empty() {
        parts.push(Part::Literal(rest));
    }
    parts
}

/// `true` if `s` contains at least one complete `{{...}}`.
pub fn has_template(s: &str) -> bool {
    parse_template(s).iter().any(|p| matches!(p, Part::Expr(_)))
}

/// Resolve a string.
///
/// A string that is exactly one `{{expr}}` returns the typed result.
/// Otherwise every expression is coerced to text and spliced in place,
/// and the result is always a string.
pub fn resolve_str(s: &str, ctx: &Context) -> Value {
    let parts = parse_template(s);
    match parts.as_slice() {
        [Part::Expr(expr)] => evaluate(expr, ctx),
        _ if !parts.iter().any(|p| matches!(p, Part::Expr(_))) => Value::String(s.to_string()),
        _ => {
            let mut out = String::with_capacity(s.len());
            for part in &parts {
                match part {
                    Part::Literal(text) => out.push_str(text),
                    Part::Expr(expr) => out.push_str(&evaluate(expr, ctx).to_display_string()),
                }
            }
            Value::String(out)
        }
    }
}

/// Resolve every string leaf inside `value`, preserving shape.
pub fn resolve(value: &Value, ctx: &Context) -> Value {
    match value {
        Value::String(s) => resolve_str(s, ctx),
        Value::List(items) => Value::List(items.iter().map(|v| resolve(v, ctx)).collect()),
        Value::Record(fields) => Value::Record(resolve_map(fields, ctx)),
        other => other.clone(),
    }
}

/// Resolve every value of a record.
pub fn resolve_map(fields: &BTreeMap<String, Value>, ctx: &Context) -> BTreeMap<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), resolve(v, ctx)))
        .collect()
}
