//! Renderer configuration.

use crate::error::ConfigError;
use crate::events::HandlerPolicy;
use crate::registry::HostPrimitives;
use serde::{Deserialize, Serialize};

/// Tunables for a [`Renderer`](crate::Renderer).
///
/// Every field has a default, so `{}` is a valid configuration:
///
/// ```json
/// { "max_depth": 32, "primitives": ["div", "span"], "value_handlers": ["onChange"] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Nesting limit; deeper subtrees render as `DepthExceeded`.
    pub max_depth: usize,
    /// `limit` applied to loader queries that do not give one.
    pub default_limit: usize,
    /// Render/settle alternations in `render_settled` before giving up.
    pub max_settle_rounds: usize,
    /// Replaces the built-in host primitive allow-list when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primitives: Option<Vec<String>>,
    #[serde(flatten)]
    pub handlers: HandlerPolicy,
    pub conditional_name: String,
    pub data_loader_name: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            default_limit: crumbview_types::DEFAULT_QUERY_LIMIT,
            max_settle_rounds: 8,
            primitives: None,
            handlers: HandlerPolicy::default(),
            conditional_name: "Conditional".to_string(),
            data_loader_name: "DataLoader".to_string(),
        }
    }
}

impl RenderConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RenderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("max_depth", self.max_depth),
            ("default_limit", self.default_limit),
            ("max_settle_rounds", self.max_settle_rounds),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }
        Ok(())
    }

    /// The host primitive allow-list this config selects.
    pub fn host_primitives(&self) -> HostPrimitives {
        match &self.primitives {
            Some(names) => HostPrimitives::from_names(names.iter().map(String::as_str)),
            None => HostPrimitives::default(),
        }
    }
}
