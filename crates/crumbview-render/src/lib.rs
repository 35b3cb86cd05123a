//! crumbview render-tree interpreter.
//!
//! A [`Renderer`] walks a node definition (plain JSON-shaped data) against
//! a [`Context`](crumbview_types::Context) and produces a [`Surface`] for
//! the host to display. Along the way it:
//!
//! - resolves `{{...}}` templates in props,
//! - expands `for_each`, `Conditional` and `DataLoader` directives,
//! - dispatches components to registered capabilities or host primitives,
//! - binds event props into [`BoundHandler`]s that snapshot their args.
//!
//! Rendering never fails. Unknown components, malformed nodes, failed
//! fetches and panicking capabilities each render as one contained node.

mod binding;
mod config;
pub mod data;
pub mod directive;
mod error;
pub mod events;
pub mod registry;
mod renderer;
mod surface;

pub use binding::ViewBinding;
pub use config::RenderConfig;
pub use data::{
    ClaimGuard, DataCache, FetchRequest, FetchState, FetchTarget, InMemoryStore, StoreClient,
};
pub use error::{ActionError, ConfigError, StoreError};
pub use events::{
    is_event_prop, ActionRunner, BoundHandler, HandlerDescriptor, HandlerInput, HandlerOutcome,
    HandlerPolicy, UiEvent,
};
pub use registry::{
    Capability, CapabilityInput, CapabilityRegistry, ComponentKind, HostPrimitives,
    DEFAULT_PRIMITIVES,
};
pub use renderer::Renderer;
pub use surface::{Surface, SurfaceNode};
