//! Shared types for crumbview.
//!
//! This crate defines the dynamic [`Value`] type, the immutable render
//! [`Context`], node-definition classification, and the external record
//! and query shapes served by the record store.

mod context;
mod node;
mod record;
mod value;

pub use context::{keys, Context};
pub use node::{classify, NodeDef, CHILDREN, FOR_EACH, RENDER_ITEM};
pub use record::{Record, RecordQuery, DEFAULT_QUERY_LIMIT};
pub use value::{format_number, Value};
