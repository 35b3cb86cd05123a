//! Component lookup: registered capabilities and host primitives.
//!
//! Both tables are built once and injected into the renderer. Dispatch is a
//! closed lookup over [`ComponentKind`]; a name nobody claims is `Unknown`.

use crate::events::BoundHandler;
use crate::surface::Surface;
use crumbview_types::{Context, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Default host primitive allow-list.
pub const DEFAULT_PRIMITIVES: &[&str] = &[
    "div", "span", "p", "a", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "section",
    "article", "header", "footer", "main", "nav", "aside", "form", "label", "input", "textarea",
    "select", "option", "button", "img", "table", "thead", "tbody", "tr", "th", "td", "pre",
    "code", "strong", "em", "small", "br", "hr",
];

// ══════════════════════════════════════════════════════════════════════════
// Capabilities
// ══════════════════════════════════════════════════════════════════════════

/// Everything a capability receives for one render.
#[derive(Debug, Clone)]
pub struct CapabilityInput {
    pub name: String,
    /// Props with templates resolved. `children` is not included.
    pub props: BTreeMap<String, Value>,
    pub handlers: BTreeMap<String, BoundHandler>,
    /// Rendered children.
    pub children: Vec<Surface>,
    /// The context the node was rendered in.
    pub context: Context,
}

/// A host-provided component.
pub trait Capability: Send + Sync {
    fn render(&self, input: CapabilityInput) -> Surface;
}

impl<F> Capability for F
where
    F: Fn(CapabilityInput) -> Surface + Send + Sync,
{
    fn render(&self, input: CapabilityInput) -> Surface {
        self(input)
    }
}

/// Named capabilities.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    entries: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability, replacing any previous one with that name.
    pub fn register(&mut self, name: impl Into<String>, capability: impl Capability + 'static) {
        self.entries.insert(name.into(), Arc::new(capability));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, name: impl Into<String>, capability: impl Capability + 'static) -> Self {
        self.register(name, capability);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Capability>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("names", &self.names())
            .finish()
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Host primitives
// ══════════════════════════════════════════════════════════════════════════

/// Lower-case element names the host renders natively. Lookup is
/// case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPrimitives {
    names: BTreeSet<String>,
}

impl HostPrimitives {
    /// Build from a name list. Names that are not all lower-case ASCII
    /// letters and digits are skipped with a warning.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut set = BTreeSet::new();
        for name in names {
            if is_primitive_name(name) {
                set.insert(name.to_string());
            } else {
                tracing::warn!(name, "host primitives must be lower-case, skipping");
            }
        }
        Self { names: set }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for HostPrimitives {
    fn default() -> Self {
        Self::from_names(DEFAULT_PRIMITIVES.iter().copied())
    }
}

fn is_primitive_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_lowercase())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

// ══════════════════════════════════════════════════════════════════════════
// Dispatch
// ══════════════════════════════════════════════════════════════════════════

/// How a component name renders.
#[derive(Clone)]
pub enum ComponentKind<'r> {
    Conditional,
    DataLoader,
    Capability(&'r Arc<dyn Capability>),
    Primitive,
    Unknown,
}

impl ComponentKind<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            ComponentKind::Conditional => "conditional",
            ComponentKind::DataLoader => "data_loader",
            ComponentKind::Capability(_) => "capability",
            ComponentKind::Primitive => "primitive",
            ComponentKind::Unknown => "unknown",
        }
    }
}

impl fmt::Debug for ComponentKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
