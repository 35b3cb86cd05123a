//! Error types for the collaborators the renderer talks to.
//!
//! None of these escape a render pass: store failures become inline
//! [`Surface::DataError`](crate::Surface::DataError) nodes and action
//! failures are logged at the handler boundary.

use thiserror::Error;

/// Failure reported by a [`StoreClient`](crate::StoreClient).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record '{0}' not found")]
    NotFound(String),
    #[error("no record store configured")]
    NoStore,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected request: {0}")]
    Rejected(String),
}

/// Failure reported by an [`ActionRunner`](crate::ActionRunner).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("action '{action}' failed: {message}")]
    Failed { action: String, message: String },
}

/// Invalid [`RenderConfig`](crate::RenderConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid render config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("render config field '{field}' must be at least 1")]
    Zero { field: &'static str },
}
