//! Render-tree interpreter.
//!
//! [`Renderer::render`] is a synchronous walk over a node definition. It
//! never fails: every problem becomes a contained [`Surface`] node. Data
//! loaders read the cache during the walk and are satisfied afterwards by
//! [`Renderer::settle`].

use crate::config::RenderConfig;
use crate::data::{self, DataCache, FetchRequest, FetchState, StoreClient};
use crate::directive;
use crate::error::StoreError;
use crate::events::{bind_handlers, panic_message, BoundHandler};
use crate::registry::{CapabilityInput, CapabilityRegistry, ComponentKind, HostPrimitives};
use crate::surface::{Surface, SurfaceNode};
use crumbview_expr::{resolve, resolve_str};
use crumbview_types::{classify, Context, NodeDef, Value, CHILDREN};
use futures::future::join_all;
use futures::FutureExt;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Interprets node definitions against a context.
pub struct Renderer {
    config: RenderConfig,
    registry: CapabilityRegistry,
    primitives: HostPrimitives,
    store: Option<Arc<dyn StoreClient>>,
    cache: DataCache,
}

impl Renderer {
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self::with_config(registry, RenderConfig::default())
    }

    pub fn with_config(registry: CapabilityRegistry, config: RenderConfig) -> Self {
        Self {
            primitives: config.host_primitives(),
            config,
            registry,
            store: None,
            cache: DataCache::new(),
        }
    }

    /// Attach the record store data loaders fetch from.
    pub fn with_store(mut self, store: Arc<dyn StoreClient>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn primitives(&self) -> &HostPrimitives {
        &self.primitives
    }

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    // ══════════════════════════════════════════════════════════════════════
    // Render walk
    // ══════════════════════════════════════════════════════════════════════

    /// Render a node definition.
    pub fn render(&self, node: &Value, ctx: &Context) -> Surface {
        self.render_node(node, ctx, 0)
    }

    pub(crate) fn render_node(&self, node: &Value, ctx: &Context, depth: usize) -> Surface {
        if depth > self.config.max_depth {
            tracing::warn!(limit = self.config.max_depth, "render depth exceeded");
            return Surface::DepthExceeded {
                limit: self.config.max_depth,
            };
        }

        match classify(node) {
            NodeDef::Empty => Surface::Empty,
            NodeDef::Text(text) => match resolve_str(text, ctx) {
                v if v.is_nullish() => Surface::Empty,
                v => Surface::Text(v.to_display_string()),
            },
            NodeDef::Scalar(v) => Surface::Text(v.to_display_string()),
            NodeDef::Sequence(items) => Surface::Fragment(
                items
                    .iter()
                    .map(|item| self.render_node(item, ctx, depth + 1))
                    .collect(),
            ),
            NodeDef::Iteration {
                source,
                render_item,
            } => directive::render_iteration(self, source, render_item, ctx, depth),
            NodeDef::Component { name, props } => self.render_component(name, &props, ctx, depth),
            NodeDef::Malformed { reason } => {
                tracing::warn!(%reason, "malformed node");
                Surface::Malformed { reason }
            }
        }
    }

    /// Decide how a component name renders.
    pub fn classify(&self, name: &str) -> ComponentKind<'_> {
        if name == self.config.conditional_name {
            ComponentKind::Conditional
        } else if name == self.config.data_loader_name {
            ComponentKind::DataLoader
        } else if let Some(capability) = self.registry.get(name) {
            ComponentKind::Capability(capability)
        } else if self.primitives.contains(name) {
            ComponentKind::Primitive
        } else {
            ComponentKind::Unknown
        }
    }

    fn render_component(
        &self,
        name: &str,
        props: &BTreeMap<String, Value>,
        ctx: &Context,
        depth: usize,
    ) -> Surface {
        let kind = self.classify(name);
        tracing::debug!(component = name, ?kind, depth, "render component");

        match kind {
            ComponentKind::Conditional => directive::render_conditional(self, props, ctx, depth),
            ComponentKind::DataLoader => directive::render_data_loader(self, props, ctx, depth),
            ComponentKind::Capability(capability) => {
                let (resolved, handlers) = self.split_props(props, ctx);
                let input = CapabilityInput {
                    name: name.to_string(),
                    props: resolved,
                    handlers,
                    children: self.render_children(props, ctx, depth),
                    context: ctx.clone(),
                };
                match catch_unwind(AssertUnwindSafe(|| capability.render(input))) {
                    Ok(surface) => surface,
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        tracing::warn!(component = name, error = %message, "capability panicked");
                        Surface::Failed {
                            name: name.to_string(),
                            message,
                        }
                    }
                }
            }
            ComponentKind::Primitive => {
                let (resolved, handlers) = self.split_props(props, ctx);
                Surface::Node(
                    SurfaceNode::new(name)
                        .with_props(resolved)
                        .with_handlers(handlers)
                        .with_children(self.render_children(props, ctx, depth)),
                )
            }
            ComponentKind::Unknown => {
                tracing::warn!(component = name, "unknown component");
                Surface::Unknown {
                    name: name.to_string(),
                }
            }
        }
    }

    /// Resolve plain props and bind event props. `children` is left out of
    /// both.
    fn split_props(
        &self,
        props: &BTreeMap<String, Value>,
        ctx: &Context,
    ) -> (BTreeMap<String, Value>, BTreeMap<String, BoundHandler>) {
        let mut resolved = BTreeMap::new();
        let mut events = Vec::new();
        for (name, value) in props {
            if name == CHILDREN {
                continue;
            }
            if self.config.handlers.is_handler_prop(name) {
                events.push((name, value));
            } else {
                resolved.insert(name.clone(), resolve(value, ctx));
            }
        }
        let handlers = bind_handlers(events, ctx, &self.config.handlers);
        (resolved, handlers)
    }

    fn render_children(
        &self,
        props: &BTreeMap<String, Value>,
        ctx: &Context,
        depth: usize,
    ) -> Vec<Surface> {
        props
            .get(CHILDREN)
            .map(|children| self.render_node(children, ctx, depth + 1).into_children())
            .unwrap_or_default()
    }

    // ══════════════════════════════════════════════════════════════════════
    // Data settling
    // ══════════════════════════════════════════════════════════════════════

    /// Fetch every request not already cached or in flight, concurrently,
    /// and store the results. Returns how many requests were settled.
    pub async fn settle<'a>(&self, requests: impl IntoIterator<Item = &'a FetchRequest>) -> usize {
        // Keys still in flight when this future is dropped are released by
        // the guard, so a cancelled settle can be retried.
        let claims = self.cache.claim_all(requests.into_iter().cloned().collect());
        if claims.is_empty() {
            return 0;
        }

        let Some(store) = self.store.clone() else {
            for request in claims.requests() {
                self.cache
                    .insert(request.key.clone(), FetchState::Failed(StoreError::NoStore.to_string()));
            }
            return claims.len();
        };

        tracing::debug!(count = claims.len(), "settling data requests");
        let fetches = claims.requests().iter().map(|request| {
            let store = Arc::clone(&store);
            async move {
                let outcome = AssertUnwindSafe(data::fetch(store.as_ref(), &request.target))
                    .catch_unwind()
                    .await;
                let state = match outcome {
                    Ok(Ok(value)) => FetchState::Ready(value),
                    Ok(Err(err)) => {
                        tracing::warn!(key = %request.key, error = %err, "fetch failed");
                        FetchState::Failed(err.to_string())
                    }
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        tracing::warn!(key = %request.key, error = %message, "store panicked");
                        FetchState::Failed(message)
                    }
                };
                (request.key.clone(), state)
            }
        });

        let results = join_all(fetches).await;
        let settled = results.len();
        for (key, state) in results {
            self.cache.insert(key, state);
        }
        settled
    }

    /// Render, settle the loaders it is waiting on, and render again until
    /// nothing is loading or `max_settle_rounds` is reached.
    pub async fn render_settled(&self, node: &Value, ctx: &Context) -> Surface {
        let mut surface = self.render(node, ctx);
        for round in 0..self.config.max_settle_rounds {
            let pending: Vec<FetchRequest> =
                surface.pending_requests().into_iter().cloned().collect();
            if pending.is_empty() {
                break;
            }
            tracing::debug!(round, pending = pending.len(), "render pass has pending data");
            if self.settle(&pending).await == 0 {
                break;
            }
            surface = self.render(node, ctx);
        }
        surface
    }

    /// Drop a cached result so the next settle fetches it again.
    pub fn invalidate(&self, request: &FetchRequest) -> bool {
        self.cache.remove(&request.key).is_some()
    }

    pub fn invalidate_all(&self) {
        self.cache.clear();
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(CapabilityRegistry::new())
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("has_store", &self.store.is_some())
            .field("cached", &self.cache.len())
            .finish()
    }
}
