//! External records served by the record store, and the query shape used
//! to select them.

use crate::Value;
use serde::{Deserialize, Serialize};

/// Number of records a query returns when no limit is given.
pub const DEFAULT_QUERY_LIMIT: usize = 10;

/// An addressable, versioned record with a tag set and a free-form payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    /// Free-form payload.
    #[serde(default)]
    pub context: Value,
    #[serde(default)]
    pub version: i64,
}

impl Record {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            tags: Vec::new(),
            schema_name: None,
            context: Value::Null,
            version: 1,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_schema(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// The record as it appears inside a render context.
    pub fn to_value(&self) -> Value {
        Value::record([
            ("id", Value::from(self.id.as_str())),
            ("title", Value::from(self.title.as_str())),
            (
                "tags",
                Value::List(self.tags.iter().map(|t| Value::from(t.as_str())).collect()),
            ),
            (
                "schema_name",
                self.schema_name
                    .as_deref()
                    .map(Value::from)
                    .unwrap_or(Value::Null),
            ),
            ("context", self.context.clone()),
            ("version", Value::from(self.version)),
        ])
    }
}

/// Record selection.
///
/// `tag` and `all_tags` must all be present on a record, `any_tags` must
/// overlap it, and `schema_name` must match exactly. Unset criteria match
/// everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, alias = "schema", skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_tags: Vec<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_QUERY_LIMIT
}

impl Default for RecordQuery {
    fn default() -> Self {
        Self {
            tag: None,
            schema_name: None,
            any_tags: Vec::new(),
            all_tags: Vec::new(),
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl RecordQuery {
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        let has = |t: &String| record.tags.iter().any(|r| r == t);
        if let Some(tag) = &self.tag {
            if !has(tag) {
                return false;
            }
        }
        if let Some(schema) = &self.schema_name {
            if record.schema_name.as_ref() != Some(schema) {
                return false;
            }
        }
        if !self.any_tags.is_empty() && !self.any_tags.iter().any(has) {
            return false;
        }
        self.all_tags.iter().all(has)
    }
}
