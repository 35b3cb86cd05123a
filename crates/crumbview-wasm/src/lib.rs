//! crumbview renderer as a WASM module for browser environments.
//!
//! Every entry point takes JSON strings and returns a JSON string, so the
//! host can stay framework-agnostic.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { render, evaluate } from 'crumbview-wasm';
//!
//! await init();
//!
//! const out = JSON.parse(render('{"p": "Hi {{state.name}}"}', '{"state": {"name": "Ada"}}'));
//! // { success: true, surface: { component: "p", props: {}, children: ["Hi Ada"] }, pending: [], error: null }
//! ```
//!
//! Data loaders need a [`WasmRenderer`], which keeps fetch results between
//! renders. The host fetches each `pending` key itself, hands the result
//! back with `supply` (or `fail`), and renders again:
//!
//! ```js
//! const view = new WasmRenderer('{}');
//! let out = JSON.parse(view.render(node, ctx));
//! for (const key of out.pending) {
//!   view.supply(key, JSON.stringify(await fetchFor(JSON.parse(key))));
//! }
//! out = JSON.parse(view.render(node, ctx));
//! ```

use crumbview_render::{FetchState, RenderConfig, Renderer};
use crumbview_types::{Context, Value};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Serialize)]
struct RenderResult {
    success: bool,
    surface: serde_json::Value,
    /// Cache keys of data loaders still waiting on records.
    pending: Vec<String>,
    error: Option<String>,
}

impl RenderResult {
    fn failure(error: String) -> Self {
        Self {
            success: false,
            surface: serde_json::Value::Null,
            pending: Vec::new(),
            error: Some(error),
        }
    }
}

fn parse_json(label: &str, json: &str) -> Result<Value, String> {
    if json.trim().is_empty() {
        return Ok(Value::Undefined);
    }
    serde_json::from_str::<serde_json::Value>(json)
        .map(Value::from)
        .map_err(|e| format!("invalid {label} JSON: {e}"))
}

fn to_json_string<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        format!(
            r#"{{"success":false,"surface":null,"pending":[],"error":"Serialization error: {}"}}"#,
            e
        )
    })
}

fn render_with(renderer: &Renderer, node_json: &str, context_json: &str) -> RenderResult {
    let node = match parse_json("node", node_json) {
        Ok(node) => node,
        Err(e) => return RenderResult::failure(e),
    };
    let context = match parse_json("context", context_json) {
        Ok(context) => Context::from_value(context),
        Err(e) => return RenderResult::failure(e),
    };

    let surface = renderer.render(&node, &context);
    RenderResult {
        success: true,
        pending: surface
            .pending_requests()
            .into_iter()
            .map(|r| r.key.clone())
            .collect(),
        surface: surface.to_json(),
        error: None,
    }
}

/// Render a node definition against a context, both given as JSON.
///
/// Returns a JSON string:
/// ```json
/// { "success": true, "surface": { ... }, "pending": [], "error": null }
/// ```
///
/// No record store is attached, so data loaders stay in their loading
/// state and their cache keys are listed in `pending`.
#[wasm_bindgen]
pub fn render(node_json: &str, context_json: &str) -> String {
    to_json_string(&render_with(&Renderer::default(), node_json, context_json))
}

/// Like [`render`], with a `RenderConfig` given as JSON.
#[wasm_bindgen]
pub fn render_with_config(node_json: &str, context_json: &str, config_json: &str) -> String {
    let result = match RenderConfig::from_json(config_json) {
        Ok(config) => {
            let renderer = Renderer::with_config(Default::default(), config);
            render_with(&renderer, node_json, context_json)
        }
        Err(e) => RenderResult::failure(e.to_string()),
    };
    to_json_string(&result)
}

/// A renderer that keeps data-loader results across calls.
#[wasm_bindgen]
pub struct WasmRenderer {
    renderer: Renderer,
}

#[wasm_bindgen]
impl WasmRenderer {
    /// Create a renderer from a `RenderConfig` JSON (empty for defaults).
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<WasmRenderer, String> {
        let config = if config_json.trim().is_empty() {
            RenderConfig::default()
        } else {
            RenderConfig::from_json(config_json).map_err(|e| e.to_string())?
        };
        Ok(Self {
            renderer: Renderer::with_config(Default::default(), config),
        })
    }

    /// Same result shape as the free [`render`] function. Loaders whose
    /// keys have been supplied render their children.
    pub fn render(&self, node_json: &str, context_json: &str) -> String {
        to_json_string(&render_with(&self.renderer, node_json, context_json))
    }

    /// Hand back the result for a pending key: one record for an id
    /// loader, a list for a query loader.
    pub fn supply(&self, key: &str, result_json: &str) -> Result<(), String> {
        let value = parse_json("result", result_json)?;
        self.renderer
            .cache()
            .insert(key, FetchState::Ready(value));
        Ok(())
    }

    /// Record a failed fetch; the loader renders `message` inline.
    pub fn fail(&self, key: &str, message: &str) {
        self.renderer
            .cache()
            .insert(key, FetchState::Failed(message.to_string()));
    }

    /// Forget a key so it is reported as pending again.
    pub fn invalidate(&self, key: &str) -> bool {
        self.renderer.cache().remove(key).is_some()
    }

    #[wasm_bindgen(js_name = invalidateAll)]
    pub fn invalidate_all(&self) {
        self.renderer.invalidate_all();
    }
}

/// Object-based variant of [`render`] for hosts that already hold parsed
/// values.
#[wasm_bindgen(js_name = renderValue)]
pub fn render_value(node: JsValue, context: JsValue) -> Result<JsValue, JsValue> {
    let node: serde_json::Value = serde_wasm_bindgen::from_value(node)?;
    let context: serde_json::Value = serde_wasm_bindgen::from_value(context)?;
    let surface = Renderer::default().render(
        &Value::from(node),
        &Context::from_value(Value::from(context)),
    );
    Ok(serde_wasm_bindgen::to_value(&surface.to_json())?)
}

/// Evaluate a single expression (the text between `{{` and `}}`).
///
/// Returns the result as JSON; `undefined` is rendered as `null`.
#[wasm_bindgen]
pub fn evaluate(expr: &str, context_json: &str) -> String {
    match parse_json("context", context_json) {
        Ok(context) => {
            crumbview_expr::evaluate(expr, &Context::from_value(context))
                .to_json()
                .to_string()
        }
        Err(e) => serde_json::json!({ "error": e }).to_string(),
    }
}

/// Resolve every `{{...}}` template inside a JSON value.
#[wasm_bindgen]
pub fn resolve(template_json: &str, context_json: &str) -> String {
    let parsed = parse_json("template", template_json)
        .and_then(|t| parse_json("context", context_json).map(|c| (t, c)));
    match parsed {
        Ok((template, context)) => {
            crumbview_expr::resolve(&template, &Context::from_value(context))
                .to_json()
                .to_string()
        }
        Err(e) => serde_json::json!({ "error": e }).to_string(),
    }
}

/// Return the crate version string.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
