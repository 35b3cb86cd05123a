//! Path expressions: `catalog[0].context.models`.

use crumbview_types::{Context, Value};
use std::borrow::Cow;

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Parse a dotted path with optional bracket indices.
///
/// Returns `None` for anything that is not a well-formed path; the
/// evaluator treats that as `undefined`.
pub fn parse_path(path: &str) -> Option<Vec<Segment>> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    let mut segments = Vec::new();
    for part in path.split('.') {
        let (name, mut rest) = match part.find('[') {
            Some(i) => (&part[..i], &part[i..]),
            None => (part, ""),
        };
        if name.is_empty() {
            // `a.[0]` and `.a` are malformed; `a[0][1]` is handled below.
            return None;
        }
        if !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '-') {
            return None;
        }
        segments.push(Segment::Key(name.to_string()));
        while !rest.is_empty() {
            let close = rest.find(']')?;
            if !rest.starts_with('[') {
                return None;
            }
            let index = rest[1..close].trim().parse::<usize>().ok()?;
            segments.push(Segment::Index(index));
            rest = &rest[close + 1..];
        }
    }
    Some(segments)
}

/// Resolve `path` against `ctx`.
///
/// A missing segment, or a `null`/`undefined` parent mid-path, yields
/// `undefined`.
pub fn lookup(ctx: &Context, path: &str) -> Value {
    match parse_path(path) {
        Some(segments) => lookup_segments(ctx, &segments),
        None => Value::Undefined,
    }
}

pub fn lookup_segments(ctx: &Context, segments: &[Segment]) -> Value {
    let Some((Segment::Key(first), rest)) = segments.split_first() else {
        return Value::Undefined;
    };
    let Some(root) = ctx.get(first) else {
        return Value::Undefined;
    };
    let mut current = Cow::Borrowed(root);
    for segment in rest {
        match step(current, segment) {
            Some(next) => current = next,
            None => return Value::Undefined,
        }
    }
    current.into_owned()
}

fn step<'a>(current: Cow<'a, Value>, segment: &Segment) -> Option<Cow<'a, Value>> {
    match current {
        Cow::Borrowed(v) => child(v, segment)
            .map(Cow::Borrowed)
            .or_else(|| derived(v, segment).map(Cow::Owned)),
        Cow::Owned(v) => child(&v, segment)
            .cloned()
            .or_else(|| derived(&v, segment))
            .map(Cow::Owned),
    }
}

fn child<'a>(value: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match (value, segment) {
        (Value::Record(fields), Segment::Key(k)) => fields.get(k),
        (Value::Record(fields), Segment::Index(i)) => fields.get(&i.to_string()),
        (Value::List(items), Segment::Index(i)) => items.get(*i),
        (Value::List(items), Segment::Key(k)) => items.get(k.parse::<usize>().ok()?),
        _ => None,
    }
}

/// Properties computed from the value rather than stored in it.
fn derived(value: &Value, segment: &Segment) -> Option<Value> {
    match (value, segment) {
        (Value::List(items), Segment::Key(k)) if k == "length" => Some(Value::from(items.len())),
        (Value::String(s), Segment::Key(k)) if k == "length" => {
            Some(Value::from(s.chars().count()))
        }
        _ => None,
    }
}
