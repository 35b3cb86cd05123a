//! Single-expression evaluation.

use crate::{calc, path};
use crumbview_types::{Context, Value};

/// Evaluate one expression (the text between `{{` and `}}`).
///
/// Cases are tried in order: `calc(...)`, `===`/`!==`, literals, and
/// finally a context path. Never mutates `ctx` and never fails.
pub fn evaluate(expr: &str, ctx: &Context) -> Value {
    let expr = expr.trim();

    if let Some(body) = calc_body(expr) {
        return calc::calc(body, ctx);
    }

    if let Some((lhs, negated, rest)) = split_equality(expr) {
        return evaluate_equality(lhs, negated, rest, ctx);
    }

    evaluate_operand(expr, ctx)
}

/// A chain `a === b !== c` groups to the right, as `a === (b !== c)`.
/// Operands are split off left to right and folded from the right, so a
/// chain of any length uses constant stack.
fn evaluate_equality(first: &str, negated: bool, mut rest: &str, ctx: &Context) -> Value {
    let mut links = vec![(first, negated)];
    while let Some((lhs, negated, tail)) = split_equality(rest) {
        links.push((lhs, negated));
        rest = tail;
    }

    let mut acc = evaluate_operand(rest.trim(), ctx);
    for (lhs, negated) in links.into_iter().rev() {
        let equal = evaluate_operand(lhs.trim(), ctx) == acc;
        acc = Value::Bool(equal != negated);
    }
    acc
}

/// `calc(...)`, a literal, or a context path.
fn evaluate_operand(expr: &str, ctx: &Context) -> Value {
    if let Some(body) = calc_body(expr) {
        return calc::calc(body, ctx);
    }

    if let Some(literal) = parse_literal(expr) {
        return literal;
    }

    path::lookup(ctx, expr)
}

/// The body of `calc(...)` when the opening parenthesis is closed by the
/// final character.
fn calc_body(expr: &str) -> Option<&str> {
    let inner = expr.strip_prefix("calc(")?.strip_suffix(')')?;
    let mut depth = 0usize;
    for ch in inner.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                // `calc(a) + calc(b)`: the first paren closes early.
                depth = depth.checked_sub(1)?;
            }
            _ => {}
        }
    }
    Some(inner)
}

/// Split at the first `===` or `!==` outside a quoted string. The flag is
/// `true` for `!==`.
fn split_equality(expr: &str) -> Option<(&str, bool, &str)> {
    let bytes = expr.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == b'\'' || c == b'"' => quote = Some(c),
            None => {
                let rest = &bytes[i..];
                if rest.starts_with(b"===") {
                    return Some((&expr[..i], false, &expr[i + 3..]));
                }
                if rest.starts_with(b"!==") {
                    return Some((&expr[..i], true, &expr[i + 3..]));
                }
            }
        }
        i += 1;
    }
    None
}

fn parse_literal(expr: &str) -> Option<Value> {
    match expr {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        "null" => return Some(Value::Null),
        "undefined" => return Some(Value::Undefined),
        _ => {}
    }
    if is_numeric_literal(expr) {
        return expr.parse::<f64>().ok().map(Value::Number);
    }
    let bytes = expr.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'\'' || first == b'"') && bytes[bytes.len() - 1] == first {
            return Some(Value::String(expr[1..expr.len() - 1].to_string()));
        }
    }
    None
}

/// `-?digits(.digits)?`
fn is_numeric_literal(expr: &str) -> bool {
    let digits = expr.strip_prefix('-').unwrap_or(expr);
    let (int, frac) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(int) && frac.map_or(true, all_digits)
}
