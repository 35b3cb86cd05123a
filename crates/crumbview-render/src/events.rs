//! Event binding.
//!
//! Handlers are bound in two phases. [`BoundHandler::bind`] runs during the
//! render walk: it resolves the descriptor's `args` against the render
//! context and keeps a snapshot of that context. [`BoundHandler::invoke`]
//! runs at interaction time and is the only place that sees the runtime
//! value or event. Because every bound handler owns its own snapshot, a
//! handler bound inside an iteration keeps its own `item`/`index` no matter
//! when it fires.

use crate::error::ActionError;
use async_trait::async_trait;
use crumbview_expr::resolve;
use crumbview_types::{keys, Context, Value};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// `true` for props named like `onClick`, `onSubmit` or `on_change`.
///
/// All-lowercase names such as `onclick` are not recognised here; they
/// count as handlers only when a [`HandlerPolicy`] lists them (see
/// [`HandlerPolicy::is_handler_prop`]).
pub fn is_event_prop(name: &str) -> bool {
    match name.strip_prefix("on") {
        Some(rest) => {
            rest.starts_with(|c: char| c.is_ascii_uppercase())
                || (rest.len() > 1 && rest.starts_with('_'))
        }
        None => false,
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Descriptors & policy
// ══════════════════════════════════════════════════════════════════════════

/// What a handler should do, as written in the node definition.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerDescriptor {
    /// `"onClick": "save"`
    Reference(String),
    /// `"onClick": { "action": "save", "args": { ... } }`
    Action(BTreeMap<String, Value>),
}

impl HandlerDescriptor {
    /// Strings and records are descriptors; anything else is not.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Reference(s.clone())),
            Value::Record(fields) => Some(Self::Action(fields.clone())),
            _ => None,
        }
    }

    /// The action name: the reference itself, or the record's `action`.
    pub fn action_name(&self) -> Option<&str> {
        match self {
            Self::Reference(name) => Some(name),
            Self::Action(fields) => fields.get("action").and_then(Value::as_str),
        }
    }

    /// The unresolved `args` template, if any.
    pub fn args_template(&self) -> Option<&Value> {
        match self {
            Self::Reference(_) => None,
            Self::Action(fields) => fields.get(keys::ARGS),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Reference(name) => Value::from(name.as_str()),
            Self::Action(fields) => Value::Record(fields.clone()),
        }
    }
}

/// Handler classification by prop name.
///
/// The two sets are independent: one decides whether the runtime argument
/// is a bare value or an event, the other whether a cancelable event has
/// its default action suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerPolicy {
    pub value_handlers: BTreeSet<String>,
    pub prevent_default_handlers: BTreeSet<String>,
}

impl Default for HandlerPolicy {
    fn default() -> Self {
        let set = |names: &[&str]| -> BTreeSet<String> {
            names.iter().map(|n| n.to_string()).collect()
        };
        Self {
            value_handlers: set(&[
                "onChange", "onValueChange", "onInput", "on_change", "onchange", "oninput",
            ]),
            prevent_default_handlers: set(&[
                "onSubmit", "onPress", "onClick", "on_submit", "on_press", "on_tap", "onsubmit",
                "onclick",
            ]),
        }
    }
}

impl HandlerPolicy {
    /// Whether a prop binds a handler: conventionally named, or listed in
    /// either set.
    pub fn is_handler_prop(&self, name: &str) -> bool {
        is_event_prop(name)
            || self.value_handlers.contains(name)
            || self.prevent_default_handlers.contains(name)
    }

    pub fn is_value_handler(&self, name: &str) -> bool {
        self.value_handlers.contains(name)
    }

    pub fn suppresses_default(&self, name: &str) -> bool {
        self.prevent_default_handlers.contains(name)
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Runtime input
// ══════════════════════════════════════════════════════════════════════════

/// An event delivered by the host surface.
#[derive(Debug)]
pub struct UiEvent {
    pub kind: String,
    /// The value carried by the event (e.g. an input's current text).
    pub value: Value,
    pub detail: Value,
    cancelable: bool,
    default_prevented: AtomicBool,
}

impl UiEvent {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: Value::Undefined,
            detail: Value::Undefined,
            cancelable: false,
            default_prevented: AtomicBool::new(false),
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }

    /// Mark the event as having a default action that may be suppressed.
    pub fn cancelable(mut self) -> Self {
        self.cancelable = true;
        self
    }

    pub fn is_cancelable(&self) -> bool {
        self.cancelable
    }

    /// Suppress the default action. No effect on non-cancelable events.
    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.store(true, Ordering::SeqCst);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::SeqCst)
    }

    pub fn to_value(&self) -> Value {
        Value::record([
            ("type", Value::from(self.kind.as_str())),
            (keys::VALUE, self.value.clone()),
            ("detail", self.detail.clone()),
            ("default_prevented", Value::Bool(self.default_prevented())),
        ])
    }
}

/// What the host passes when a handler fires.
#[derive(Debug, Clone, Default)]
pub enum HandlerInput {
    #[default]
    None,
    /// A bare value, as from a change callback.
    Value(Value),
    /// An event object.
    Event(Arc<UiEvent>),
}

impl From<Value> for HandlerInput {
    fn from(value: Value) -> Self {
        HandlerInput::Value(value)
    }
}

impl From<UiEvent> for HandlerInput {
    fn from(event: UiEvent) -> Self {
        HandlerInput::Event(Arc::new(event))
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Action runner
// ══════════════════════════════════════════════════════════════════════════

/// Executes user-triggered side effects. The sole exit point for
/// interactions.
#[async_trait]
pub trait ActionRunner: Send + Sync {
    async fn execute(
        &self,
        descriptor: &HandlerDescriptor,
        ctx: &Context,
    ) -> Result<(), ActionError>;
}

/// How an invocation ended. Failures have already been logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    Completed,
    Failed(String),
}

// ══════════════════════════════════════════════════════════════════════════
// Bound handler
// ══════════════════════════════════════════════════════════════════════════

/// A handler bound at render time.
#[derive(Debug, Clone)]
pub struct BoundHandler {
    name: String,
    descriptor: HandlerDescriptor,
    captured_args: BTreeMap<String, Value>,
    scope: Context,
    value_handler: bool,
    suppress_default: bool,
}

impl BoundHandler {
    /// Capture `args` against the render-time context.
    pub fn bind(
        name: impl Into<String>,
        descriptor: HandlerDescriptor,
        ctx: &Context,
        policy: &HandlerPolicy,
    ) -> Self {
        let name = name.into();
        let captured_args = match descriptor.args_template().map(|t| resolve(t, ctx)) {
            Some(Value::Record(fields)) => fields,
            Some(Value::Undefined | Value::Null) | None => BTreeMap::new(),
            Some(other) => {
                tracing::warn!(
                    handler = %name,
                    found = other.type_name(),
                    "handler args must resolve to a record, ignoring"
                );
                BTreeMap::new()
            }
        };
        Self {
            value_handler: policy.is_value_handler(&name),
            suppress_default: policy.suppresses_default(&name),
            name,
            descriptor,
            captured_args,
            scope: ctx.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &HandlerDescriptor {
        &self.descriptor
    }

    /// Arguments as resolved at bind time.
    pub fn captured_args(&self) -> &BTreeMap<String, Value> {
        &self.captured_args
    }

    /// The render-time context this handler closed over.
    pub fn scope(&self) -> &Context {
        &self.scope
    }

    pub fn is_value_handler(&self) -> bool {
        self.value_handler
    }

    pub fn suppresses_default(&self) -> bool {
        self.suppress_default
    }

    /// Build the context an invocation runs with:
    /// `scope ⊕ { event, args: captured ⊕ { value } }`.
    pub fn invocation_context(&self, input: &HandlerInput) -> Context {
        let (event, value) = match input {
            HandlerInput::None => (Value::Undefined, Value::Undefined),
            HandlerInput::Event(event) => (event.to_value(), event.value.clone()),
            HandlerInput::Value(v) if self.value_handler => (Value::Undefined, v.clone()),
            // An event handler fed plain data treats it as the event payload.
            HandlerInput::Value(v) => {
                let value = v.get(keys::VALUE).cloned().unwrap_or_else(|| v.clone());
                (v.clone(), value)
            }
        };
        let mut args = self.captured_args.clone();
        args.insert(keys::VALUE.to_string(), value);
        self.scope
            .extend([(keys::EVENT, event), (keys::ARGS, Value::Record(args))])
    }

    /// Run the handler. Errors and panics from the runner are logged and
    /// reported in the outcome, never propagated.
    pub async fn invoke(&self, runner: &dyn ActionRunner, input: HandlerInput) -> HandlerOutcome {
        if self.suppress_default {
            if let HandlerInput::Event(event) = &input {
                event.prevent_default();
            }
        }
        let ctx = self.invocation_context(&input);
        tracing::debug!(handler = %self.name, action = ?self.descriptor.action_name(), "invoking handler");

        let result = AssertUnwindSafe(runner.execute(&self.descriptor, &ctx))
            .catch_unwind()
            .await;
        match result {
            Ok(Ok(())) => HandlerOutcome::Completed,
            Ok(Err(err)) => {
                tracing::warn!(handler = %self.name, error = %err, "handler failed");
                HandlerOutcome::Failed(err.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(handler = %self.name, error = %message, "handler panicked");
                HandlerOutcome::Failed(message)
            }
        }
    }

    /// Serializable view: descriptor plus captured arguments.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "descriptor": self.descriptor.to_value().to_json(),
            "args": Value::Record(self.captured_args.clone()).to_json(),
        })
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panicked".to_string())
}

/// Bind every event prop of a node. Props that are not descriptors are
/// dropped with a warning.
pub fn bind_handlers<'a, I>(
    event_props: I,
    ctx: &Context,
    policy: &HandlerPolicy,
) -> BTreeMap<String, BoundHandler>
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    let mut handlers = BTreeMap::new();
    for (name, raw) in event_props {
        match HandlerDescriptor::from_value(raw) {
            Some(descriptor) => {
                handlers.insert(
                    name.clone(),
                    BoundHandler::bind(name.as_str(), descriptor, ctx, policy),
                );
            }
            None => {
                tracing::warn!(handler = %name, found = raw.type_name(), "not a handler descriptor, ignoring");
            }
        }
    }
    handlers
}
