//! Render output handed to the host surface.

use crate::data::FetchRequest;
use crate::events::BoundHandler;
use crumbview_types::Value;
use std::collections::BTreeMap;

/// One rendered component with resolved props, bound handlers, and
/// rendered children.
#[derive(Debug, Clone)]
pub struct SurfaceNode {
    /// Component name (e.g. `"div"`, `"Button"`).
    pub component: String,
    pub props: BTreeMap<String, Value>,
    pub handlers: BTreeMap<String, BoundHandler>,
    pub children: Vec<Surface>,
}

impl SurfaceNode {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            props: BTreeMap::new(),
            handlers: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_props(mut self, props: BTreeMap<String, Value>) -> Self {
        self.props = props;
        self
    }

    pub fn with_handlers(mut self, handlers: BTreeMap<String, BoundHandler>) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn with_children(mut self, children: Vec<Surface>) -> Self {
        self.children = children;
        self
    }

    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    pub fn handler(&self, name: &str) -> Option<&BoundHandler> {
        self.handlers.get(name)
    }
}

/// The output of a render pass.
///
/// Failures are values: an unknown component, a malformed node, a failed
/// fetch or a panicking capability each become one contained node and
/// never affect their siblings.
#[derive(Debug, Clone)]
pub enum Surface {
    /// Nothing to show.
    Empty,
    Text(String),
    /// Ordered outputs of a sequence or iteration.
    Fragment(Vec<Surface>),
    Node(SurfaceNode),
    /// A data loader waiting for its records.
    Loading { request: FetchRequest },
    /// A data loader whose fetch failed.
    DataError { message: String },
    /// No directive, capability or primitive has this name.
    Unknown { name: String },
    /// A node definition that fits no shape.
    Malformed { reason: String },
    /// A capability panicked while rendering.
    Failed { name: String, message: String },
    /// The tree nests deeper than the configured limit.
    DepthExceeded { limit: usize },
}

impl Surface {
    /// Flatten into a child list: fragments are spliced, empties dropped.
    pub fn into_children(self) -> Vec<Surface> {
        match self {
            Surface::Empty => Vec::new(),
            Surface::Fragment(items) => items
                .into_iter()
                .flat_map(Surface::into_children)
                .collect(),
            other => vec![other],
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Surface::Empty => true,
            Surface::Fragment(items) => items.iter().all(Surface::is_empty),
            _ => false,
        }
    }

    pub fn as_node(&self) -> Option<&SurfaceNode> {
        match self {
            Surface::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Visit this surface and all descendants, depth first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Surface)) {
        visit(self);
        let children = match self {
            Surface::Fragment(items) => items.as_slice(),
            Surface::Node(node) => node.children.as_slice(),
            _ => return,
        };
        for child in children {
            child.walk(visit);
        }
    }

    /// All text leaves, concatenated in render order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.walk(&mut |s| {
            if let Surface::Text(t) = s {
                out.push_str(t);
            }
        });
        out
    }

    /// Every node with the given component name, in render order.
    pub fn find_all(&self, component: &str) -> Vec<&SurfaceNode> {
        let mut out = Vec::new();
        self.walk(&mut |s| {
            if let Surface::Node(node) = s {
                if node.component == component {
                    out.push(node);
                }
            }
        });
        out
    }

    /// Every bound handler with the given name, in render order.
    pub fn handlers(&self, name: &str) -> Vec<&BoundHandler> {
        let mut out = Vec::new();
        self.walk(&mut |s| {
            if let Surface::Node(node) = s {
                if let Some(h) = node.handlers.get(name) {
                    out.push(h);
                }
            }
        });
        out
    }

    /// Fetches that loaders in this surface are waiting on.
    pub fn pending_requests(&self) -> Vec<&FetchRequest> {
        let mut out = Vec::new();
        self.walk(&mut |s| {
            if let Surface::Loading { request } = s {
                out.push(request);
            }
        });
        out
    }

    /// Serialize for a host that consumes JSON.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            Surface::Empty => serde_json::Value::Null,
            Surface::Text(t) => serde_json::Value::String(t.clone()),
            Surface::Fragment(items) => {
                serde_json::Value::Array(items.iter().map(Surface::to_json).collect())
            }
            Surface::Node(node) => node_to_json(node),
            Surface::Loading { request } => json!({ "loading": request.key }),
            Surface::DataError { message } => json!({ "error": message }),
            Surface::Unknown { name } => json!({ "unknown": name }),
            Surface::Malformed { reason } => json!({ "malformed": reason }),
            Surface::Failed { name, message } => json!({ "failed": name, "message": message }),
            Surface::DepthExceeded { limit } => json!({ "depth_exceeded": limit }),
        }
    }
}

fn node_to_json(node: &SurfaceNode) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    map.insert(
        "component".to_string(),
        serde_json::Value::String(node.component.clone()),
    );

    let props: serde_json::Map<String, serde_json::Value> = node
        .props
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect();
    map.insert("props".to_string(), serde_json::Value::Object(props));

    if !node.handlers.is_empty() {
        let handlers: serde_json::Map<String, serde_json::Value> = node
            .handlers
            .iter()
            .map(|(k, h)| (k.clone(), h.to_json()))
            .collect();
        map.insert("handlers".to_string(), serde_json::Value::Object(handlers));
    }

    if !node.children.is_empty() {
        map.insert(
            "children".to_string(),
            serde_json::Value::Array(node.children.iter().map(Surface::to_json).collect()),
        );
    }

    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_children_splices_fragments() {
        let s = Surface::Fragment(vec![
            Surface::Text("a".into()),
            Surface::Empty,
            Surface::Fragment(vec![Surface::Text("b".into())]),
        ]);
        let children = s.into_children();
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn text_content_walks_nodes() {
        let s = Surface::Node(SurfaceNode::new("p").with_children(vec![
            Surface::Text("hello ".into()),
            Surface::Node(SurfaceNode::new("b").with_children(vec![Surface::Text("world".into())])),
        ]));
        assert_eq!(s.text_content(), "hello world");
        assert_eq!(s.find_all("b").len(), 1);
    }

    #[test]
    fn json_omits_empty_sections() {
        let s = Surface::Node(SurfaceNode::new("hr"));
        assert_eq!(
            s.to_json(),
            serde_json::json!({"component": "hr", "props": {}})
        );
    }
}
