//! Immutable render context threaded through a tree walk.

use crate::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Reserved context keys.
pub mod keys {
    /// Caller-owned view model.
    pub const STATE: &str = "state";
    /// Externally loaded records.
    pub const DATA: &str = "data";
    /// Current element inside an iteration subtree.
    pub const ITEM: &str = "item";
    /// Current position inside an iteration subtree.
    pub const INDEX: &str = "index";
    /// Resolved handler arguments plus the runtime value.
    pub const ARGS: &str = "args";
    /// The runtime event, inside handler invocation.
    pub const EVENT: &str = "event";
    /// Runtime value key inside `args`.
    pub const VALUE: &str = "value";
}

#[derive(Debug)]
struct Frame {
    bindings: BTreeMap<String, Value>,
    parent: Option<Arc<Frame>>,
}

/// A persistent chain of binding frames.
///
/// Contexts are never mutated. [`Context::extend`] returns a new context
/// whose innermost frame holds the new bindings and whose parent is the
/// receiver, so siblings never observe each other's extensions and a
/// clone is a reference-count bump. Lookups search innermost to outermost.
#[derive(Debug, Clone, Default)]
pub struct Context {
    head: Option<Arc<Frame>>,
}

impl Context {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context with a single frame holding `bindings`.
    pub fn from_bindings(bindings: BTreeMap<String, Value>) -> Self {
        Self::new().extend(bindings)
    }

    /// A context built from a record value. Non-record values yield an
    /// empty context.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Record(fields) => Self::from_bindings(fields),
            _ => Self::new(),
        }
    }

    /// Return a new context with `bindings` layered over this one.
    pub fn extend<K, I>(&self, bindings: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let bindings: BTreeMap<String, Value> =
            bindings.into_iter().map(|(k, v)| (k.into(), v)).collect();
        if bindings.is_empty() {
            return self.clone();
        }
        Self {
            head: Some(Arc::new(Frame {
                bindings,
                parent: self.head.clone(),
            })),
        }
    }

    /// Return a new context with a single binding layered over this one.
    pub fn with(&self, name: impl Into<String>, value: Value) -> Self {
        self.extend([(name.into(), value)])
    }

    /// Look up a binding, searching from the innermost frame outward.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let mut frame = self.head.as_deref();
        while let Some(f) = frame {
            if let Some(v) = f.bindings.get(name) {
                return Some(v);
            }
            frame = f.parent.as_deref();
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of frames in the chain.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut frame = self.head.as_deref();
        while let Some(f) = frame {
            depth += 1;
            frame = f.parent.as_deref();
        }
        depth
    }

    /// Collapse all frames into one map, inner bindings shadowing outer.
    pub fn flatten(&self) -> BTreeMap<String, Value> {
        let mut frames = Vec::new();
        let mut frame = self.head.as_deref();
        while let Some(f) = frame {
            frames.push(&f.bindings);
            frame = f.parent.as_deref();
        }
        let mut out = BTreeMap::new();
        for bindings in frames.into_iter().rev() {
            for (k, v) in bindings {
                out.insert(k.clone(), v.clone());
            }
        }
        out
    }

    /// The flattened context as a record value.
    pub fn to_value(&self) -> Value {
        Value::Record(self.flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_shadows_without_mutating_parent() {
        let base = Context::new().with("item", Value::from("outer"));
        let inner = base.with("item", Value::from("inner"));
        assert_eq!(base.get("item"), Some(&Value::from("outer")));
        assert_eq!(inner.get("item"), Some(&Value::from("inner")));
    }

    #[test]
    fn siblings_do_not_see_each_other() {
        let base = Context::new().with("state", Value::Null);
        let a = base.with("a", Value::from(1i64));
        let b = base.with("b", Value::from(2i64));
        assert!(a.get("b").is_none());
        assert!(b.get("a").is_none());
        assert!(a.contains("state") && b.contains("state"));
    }

    #[test]
    fn flatten_prefers_inner_bindings() {
        let ctx = Context::new()
            .extend([("x", Value::from(1i64)), ("y", Value::from(2i64))])
            .with("x", Value::from(3i64));
        let flat = ctx.flatten();
        assert_eq!(flat.get("x"), Some(&Value::Number(3.0)));
        assert_eq!(flat.get("y"), Some(&Value::Number(2.0)));
        assert_eq!(ctx.depth(), 2);
    }
}
