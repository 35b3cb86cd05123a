//! Node-definition classification.
//!
//! A node definition is plain data: a scalar, a sequence of nodes, a
//! single-key record `{ componentName: props }`, or the iteration shape
//! `{ for_each, render_item }`. [`classify`] maps a [`Value`] onto one of
//! these without resolving any templates.

use crate::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Key holding the iteration source expression.
pub const FOR_EACH: &str = "for_each";
/// Key holding the per-element subtree.
pub const RENDER_ITEM: &str = "render_item";
/// Prop holding a component's child node definitions.
pub const CHILDREN: &str = "children";

/// A classified node definition, borrowing from the source value.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeDef<'a> {
    /// `undefined` or `null`: renders nothing.
    Empty,
    /// A string leaf, possibly containing `{{...}}` templates.
    Text(&'a str),
    /// A number or boolean leaf.
    Scalar(&'a Value),
    /// An ordered sequence of nodes.
    Sequence(&'a [Value]),
    /// `{ for_each, render_item }`.
    Iteration {
        source: &'a Value,
        render_item: &'a Value,
    },
    /// `{ name: props }`. Non-record props are normalized to
    /// `{ children: props }`.
    Component {
        name: &'a str,
        props: Cow<'a, BTreeMap<String, Value>>,
    },
    /// A record that fits none of the shapes above.
    Malformed { reason: String },
}

/// Classify a node definition.
pub fn classify(node: &Value) -> NodeDef<'_> {
    match node {
        Value::Undefined | Value::Null => NodeDef::Empty,
        Value::String(s) => NodeDef::Text(s),
        Value::Bool(_) | Value::Number(_) => NodeDef::Scalar(node),
        Value::List(items) => NodeDef::Sequence(items),
        Value::Record(fields) => classify_record(fields),
    }
}

fn classify_record(fields: &BTreeMap<String, Value>) -> NodeDef<'_> {
    match (fields.get(FOR_EACH), fields.get(RENDER_ITEM)) {
        (Some(source), Some(render_item)) => {
            return NodeDef::Iteration {
                source,
                render_item,
            }
        }
        (Some(_), None) => {
            return NodeDef::Malformed {
                reason: format!("'{FOR_EACH}' without '{RENDER_ITEM}'"),
            }
        }
        (None, Some(_)) => {
            return NodeDef::Malformed {
                reason: format!("'{RENDER_ITEM}' without '{FOR_EACH}'"),
            }
        }
        (None, None) => {}
    }

    let mut entries = fields.iter();
    match (entries.next(), entries.next()) {
        (None, _) => NodeDef::Malformed {
            reason: "empty node record".to_string(),
        },
        (Some((name, props)), None) => NodeDef::Component {
            name,
            props: match props {
                Value::Record(map) => Cow::Borrowed(map),
                Value::Undefined | Value::Null => Cow::Owned(BTreeMap::new()),
                other => Cow::Owned(BTreeMap::from([(CHILDREN.to_string(), other.clone())])),
            },
        },
        (Some(_), Some(_)) => NodeDef::Malformed {
            reason: format!(
                "node record must have exactly one component key, found {}: {}",
                fields.len(),
                fields.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
        },
    }
}
