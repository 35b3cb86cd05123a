//! Host-facing view binding.

use crate::events::{ActionRunner, BoundHandler, HandlerInput, HandlerOutcome};
use crate::renderer::Renderer;
use crate::surface::Surface;
use crumbview_types::{keys, Context, Value};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A renderer paired with a fixed action runner and the base `state` and
/// `data` every render starts from.
pub struct ViewBinding {
    renderer: Arc<Renderer>,
    runner: Arc<dyn ActionRunner>,
    state: RwLock<Value>,
    data: RwLock<Value>,
}

impl ViewBinding {
    pub fn new(renderer: Arc<Renderer>, runner: Arc<dyn ActionRunner>) -> Self {
        Self {
            renderer,
            runner,
            state: RwLock::new(Value::Record(BTreeMap::new())),
            data: RwLock::new(Value::Undefined),
        }
    }

    pub fn with_state(self, state: Value) -> Self {
        *self.state.write() = state;
        self
    }

    pub fn with_data(self, data: Value) -> Self {
        *self.data.write() = data;
        self
    }

    /// Replace the base state. Takes effect on the next render.
    pub fn set_state(&self, state: Value) {
        *self.state.write() = state;
    }

    pub fn set_data(&self, data: Value) {
        *self.data.write() = data;
    }

    pub fn state(&self) -> Value {
        self.state.read().clone()
    }

    pub fn renderer(&self) -> &Arc<Renderer> {
        &self.renderer
    }

    /// The root context: `{ state, data }`.
    pub fn context(&self) -> Context {
        Context::new().extend([
            (keys::STATE, self.state.read().clone()),
            (keys::DATA, self.data.read().clone()),
        ])
    }

    pub fn render(&self, node: &Value) -> Surface {
        self.renderer.render(node, &self.context())
    }

    pub async fn render_settled(&self, node: &Value) -> Surface {
        let ctx = self.context();
        self.renderer.render_settled(node, &ctx).await
    }

    /// Fire a handler from a rendered surface through this binding's runner.
    pub async fn dispatch(
        &self,
        handler: &BoundHandler,
        input: impl Into<HandlerInput>,
    ) -> HandlerOutcome {
        handler.invoke(self.runner.as_ref(), input.into()).await
    }
}
