//! Control-flow directives.
//!
//! Each directive takes its node, the current context and depth, and calls
//! back into [`Renderer::render_node`] for the subtrees it selects.

use crate::data::{FetchRequest, FetchState};
use crate::renderer::Renderer;
use crate::surface::Surface;
use crumbview_expr::resolve;
use crumbview_types::{keys, Context, Value, CHILDREN};
use std::collections::BTreeMap;

/// `{ for_each, render_item }`: render `render_item` once per element of
/// the resolved source, with `item` and `index` bound.
pub fn render_iteration(
    renderer: &Renderer,
    source: &Value,
    render_item: &Value,
    ctx: &Context,
    depth: usize,
) -> Surface {
    let items = match resolve(source, ctx) {
        Value::List(items) => items,
        other => {
            if !other.is_nullish() {
                tracing::debug!(found = other.type_name(), "for_each source is not a list");
            }
            return Surface::Fragment(Vec::new());
        }
    };

    let outputs = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let scope = ctx.extend([(keys::ITEM, item), (keys::INDEX, Value::from(index))]);
            renderer.render_node(render_item, &scope, depth + 1)
        })
        .collect();
    Surface::Fragment(outputs)
}

/// `{ Conditional: { condition, render, else } }`.
pub fn render_conditional(
    renderer: &Renderer,
    props: &BTreeMap<String, Value>,
    ctx: &Context,
    depth: usize,
) -> Surface {
    let condition = props
        .get("condition")
        .map(|c| resolve(c, ctx))
        .unwrap_or_default();
    let branch = if condition.is_truthy() {
        props.get("render")
    } else {
        props.get("else")
    };
    match branch {
        Some(node) => renderer.render_node(node, ctx, depth + 1),
        None => Surface::Empty,
    }
}

/// `{ DataLoader: { id | query, as, children } }`.
///
/// Reads the renderer's cache only. An uncached request renders as a
/// loading placeholder carrying the request, to be fetched by
/// [`Renderer::settle`].
pub fn render_data_loader(
    renderer: &Renderer,
    props: &BTreeMap<String, Value>,
    ctx: &Context,
    depth: usize,
) -> Surface {
    let resolved: BTreeMap<String, Value> = props
        .iter()
        .filter(|(k, _)| k.as_str() != CHILDREN)
        .map(|(k, v)| (k.clone(), resolve(v, ctx)))
        .collect();

    let request = match FetchRequest::from_props(&resolved, renderer.config().default_limit) {
        Ok(request) => request,
        Err(message) => {
            tracing::warn!(%message, "data loader has no usable request");
            return Surface::DataError { message };
        }
    };

    let alias = resolved
        .get("as")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(keys::DATA)
        .to_string();

    match renderer.cache().get(&request.key) {
        None | Some(FetchState::InFlight) => Surface::Loading { request },
        Some(FetchState::Failed(message)) => Surface::DataError { message },
        Some(FetchState::Ready(records)) => match props.get(CHILDREN) {
            Some(children) => {
                let scope = ctx.with(alias, records);
                renderer.render_node(children, &scope, depth + 1)
            }
            None => Surface::Empty,
        },
    }
}
