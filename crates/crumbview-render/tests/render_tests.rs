//! Integration tests for the render-tree interpreter.
//!
//! Covers:
//! - scalar, text and sequence nodes
//! - host primitives and registered capabilities
//! - for_each iteration and scope isolation
//! - the Conditional directive
//! - contained failures: unknown, malformed, depth, panicking capability

use crumbview_render::{
    CapabilityInput, CapabilityRegistry, ComponentKind, RenderConfig, Renderer, Surface,
    SurfaceNode,
};
use crumbview_types::{Context, Value};
use serde_json::json;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn ctx(json: serde_json::Value) -> Context {
    Context::from_value(Value::from(json))
}

fn render(node: serde_json::Value, context: serde_json::Value) -> Surface {
    Renderer::default().render(&v(node), &ctx(context))
}

fn node(surface: &Surface) -> &SurfaceNode {
    surface
        .as_node()
        .unwrap_or_else(|| panic!("expected a node, got {surface:?}"))
}

// ══════════════════════════════════════════════════════════════════════════════
// Leaves & sequences
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn text_leaf_resolves_templates() {
    let s = render(json!("Hello {{state.name}}"), json!({"state": {"name": "Ada"}}));
    assert!(matches!(s, Surface::Text(ref t) if t == "Hello Ada"));
}

#[test]
fn scalars_render_as_text() {
    assert!(matches!(render(json!(3), json!({})), Surface::Text(ref t) if t == "3"));
    assert!(matches!(render(json!(true), json!({})), Surface::Text(ref t) if t == "true"));
}

#[test]
fn null_and_missing_render_nothing() {
    assert!(render(json!(null), json!({})).is_empty());
    assert!(render(json!("{{missing}}"), json!({})).is_empty());
}

#[test]
fn sequence_preserves_order() {
    let s = render(json!(["a", {"span": "b"}, "c"]), json!({}));
    assert_eq!(s.text_content(), "abc");
    match s {
        Surface::Fragment(items) => assert_eq!(items.len(), 3),
        other => panic!("expected fragment, got {other:?}"),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Primitives
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn primitive_resolves_props_and_renders_children() {
    let s = render(
        json!({"div": {
            "class": "card {{state.kind}}",
            "count": "{{state.n}}",
            "children": [{"h1": "{{state.title}}"}, {"p": "body"}]
        }}),
        json!({"state": {"kind": "wide", "n": 2, "title": "Hi"}}),
    );
    let div = node(&s);
    assert_eq!(div.component, "div");
    assert_eq!(div.prop("class"), Some(&Value::from("card wide")));
    assert_eq!(div.prop("count"), Some(&Value::Number(2.0)));
    assert!(div.prop("children").is_none());
    assert_eq!(div.children.len(), 2);
    assert_eq!(s.text_content(), "Hibody");
}

#[test]
fn event_props_become_handlers_not_props() {
    let s = render(
        json!({"button": {"onClick": "save", "label": "Save"}}),
        json!({}),
    );
    let button = node(&s);
    assert!(button.prop("onClick").is_none());
    assert_eq!(
        button.handler("onClick").and_then(|h| h.descriptor().action_name()),
        Some("save")
    );
}

#[test]
fn lowercase_event_props_bind_when_listed_by_policy() {
    let s = render(
        json!({"form": {"onsubmit": "send", "online": "{{state.up}}"}}),
        json!({"state": {"up": true}}),
    );
    let form = node(&s);
    assert!(form.prop("onsubmit").is_none());
    assert_eq!(
        form.handler("onsubmit").and_then(|h| h.descriptor().action_name()),
        Some("send")
    );
    assert_eq!(form.prop("online"), Some(&Value::Bool(true)));
    assert!(form.handler("online").is_none());
}

#[test]
fn primitive_lookup_is_case_sensitive() {
    let s = render(json!({"Div": {}}), json!({}));
    assert!(matches!(s, Surface::Unknown { ref name } if name == "Div"));
}

#[test]
fn primitive_allow_list_is_configurable() {
    let config = RenderConfig::from_json(r#"{"primitives": ["section"]}"#).unwrap();
    let renderer = Renderer::with_config(CapabilityRegistry::new(), config);
    assert!(matches!(renderer.classify("section"), ComponentKind::Primitive));
    assert!(matches!(renderer.classify("div"), ComponentKind::Unknown));
}

// ══════════════════════════════════════════════════════════════════════════════
// Capabilities
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn capability_receives_resolved_props_and_rendered_children() {
    let registry = CapabilityRegistry::new().with("Card", |input: CapabilityInput| {
        let title = input
            .props
            .get("title")
            .map(Value::to_display_string)
            .unwrap_or_default();
        let mut children = vec![Surface::Text(format!("[{title}]"))];
        children.extend(input.children);
        Surface::Fragment(children)
    });
    let renderer = Renderer::new(registry);
    let s = renderer.render(
        &v(json!({"Card": {"title": "{{state.t}}", "children": ["x", "y"]}})),
        &ctx(json!({"state": {"t": "T"}})),
    );
    assert_eq!(s.text_content(), "[T]xy");
}

#[test]
fn capability_shadows_primitive_of_same_name() {
    let registry =
        CapabilityRegistry::new().with("div", |_: CapabilityInput| Surface::Text("cap".into()));
    let renderer = Renderer::new(registry);
    assert!(matches!(renderer.classify("div"), ComponentKind::Capability(_)));
    assert_eq!(renderer.render(&v(json!({"div": {}})), &Context::new()).text_content(), "cap");
}

#[test]
fn panicking_capability_is_contained() {
    let registry = CapabilityRegistry::new()
        .with("Boom", |_: CapabilityInput| -> Surface { panic!("kaboom") });
    let renderer = Renderer::new(registry);
    let s = renderer.render(
        &v(json!(["before", {"Boom": {}}, "after"])),
        &Context::new(),
    );
    match &s {
        Surface::Fragment(items) => {
            assert!(matches!(&items[1], Surface::Failed { name, message } if name == "Boom" && message == "kaboom"));
        }
        other => panic!("expected fragment, got {other:?}"),
    }
    assert_eq!(s.text_content(), "beforeafter");
}

// ══════════════════════════════════════════════════════════════════════════════
// Iteration
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn for_each_binds_item_and_index() {
    let s = render(
        json!({"for_each": "{{state.items}}", "render_item": {"li": "{{item}}-{{index}}"}}),
        json!({"state": {"items": ["a", "b"]}}),
    );
    let lis = s.find_all("li");
    assert_eq!(lis.len(), 2);
    assert_eq!(
        Surface::Node(lis[0].clone()).text_content(),
        "a-0"
    );
    assert_eq!(
        Surface::Node(lis[1].clone()).text_content(),
        "b-1"
    );
}

#[test]
fn for_each_through_text_capability() {
    let registry = CapabilityRegistry::new().with("Text", |input: CapabilityInput| {
        Surface::Text(
            input
                .props
                .get("value")
                .map(Value::to_display_string)
                .unwrap_or_default(),
        )
    });
    let s = Renderer::new(registry).render(
        &v(json!({"for_each": "{{items}}", "render_item": {"Text": {"value": "{{item}}-{{index}}"}}})),
        &ctx(json!({"items": ["a", "b"]})),
    );
    match s {
        Surface::Fragment(items) => {
            let texts: Vec<String> = items.iter().map(Surface::text_content).collect();
            assert_eq!(texts, vec!["a-0", "b-1"]);
        }
        other => panic!("expected fragment, got {other:?}"),
    }
}

#[test]
fn for_each_over_non_list_is_empty() {
    for source in [json!("{{missing}}"), json!("{{state.n}}"), json!("plain")] {
        let s = render(
            json!({"for_each": source, "render_item": "x"}),
            json!({"state": {"n": 3}}),
        );
        assert!(s.is_empty(), "{s:?}");
    }
}

#[test]
fn for_each_accepts_literal_list() {
    let s = render(
        json!({"for_each": [1, 2, 3], "render_item": "{{calc(item * 10)}},"}),
        json!({}),
    );
    assert_eq!(s.text_content(), "10,20,30,");
}

#[test]
fn iteration_scope_does_not_leak_to_siblings() {
    let s = render(
        json!({"div": {"children": [
            {"for_each": "{{xs}}", "render_item": "{{item}}"},
            "[{{item}}]"
        ]}}),
        json!({"xs": ["a", "b"]}),
    );
    assert_eq!(s.text_content(), "ab[]");
}

#[test]
fn nested_iteration_shadows_outer_item() {
    let s = render(
        json!({"for_each": "{{rows}}", "render_item": {
            "ul": {"children": {"for_each": "{{item.cells}}", "render_item": "{{item}}"}}
        }}),
        json!({"rows": [{"cells": [1, 2]}, {"cells": [3]}]}),
    );
    assert_eq!(s.find_all("ul").len(), 2);
    assert_eq!(s.text_content(), "123");
}

// ══════════════════════════════════════════════════════════════════════════════
// Conditional
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn conditional_selects_branch() {
    let node = json!({"Conditional": {
        "condition": "{{state.tab === 'home'}}",
        "render": "home",
        "else": "other"
    }});
    assert_eq!(render(node.clone(), json!({"state": {"tab": "home"}})).text_content(), "home");
    assert_eq!(render(node, json!({"state": {"tab": "x"}})).text_content(), "other");
}

#[test]
fn conditional_false_without_else_renders_nothing() {
    let s = render(
        json!({"Conditional": {"condition": "{{state.show}}", "render": "shown"}}),
        json!({"state": {"show": false}}),
    );
    assert!(matches!(s, Surface::Empty));
}

#[test]
fn conditional_uses_truthiness() {
    let node = json!({"Conditional": {"condition": "{{x}}", "render": "yes", "else": "no"}});
    for (x, expected) in [
        (json!(0), "no"),
        (json!(""), "no"),
        (json!(null), "no"),
        (json!([]), "yes"),
        (json!("0"), "yes"),
    ] {
        assert_eq!(render(node.clone(), json!({"x": x})).text_content(), expected);
    }
}

#[test]
fn conditional_name_is_configurable() {
    let config = RenderConfig::from_json(r#"{"conditional_name": "If"}"#).unwrap();
    let renderer = Renderer::with_config(CapabilityRegistry::new(), config);
    let s = renderer.render(
        &v(json!({"If": {"condition": true, "render": "ok"}})),
        &Context::new(),
    );
    assert_eq!(s.text_content(), "ok");
}

// ══════════════════════════════════════════════════════════════════════════════
// Contained failures
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn unknown_component_renders_fallback_and_siblings_render() {
    let s = render(
        json!({"div": {"children": [{"p": "one"}, {"Mystery": {"a": 1}}, {"p": "two"}]}}),
        json!({}),
    );
    let div = node(&s);
    assert_eq!(div.children.len(), 3);
    assert!(matches!(&div.children[1], Surface::Unknown { name } if name == "Mystery"));
    assert_eq!(s.text_content(), "onetwo");
}

#[test]
fn multi_key_record_is_malformed() {
    let s = render(json!([{"p": "ok"}, {"a": {}, "b": {}}]), json!({}));
    match s {
        Surface::Fragment(items) => {
            assert!(matches!(items[0], Surface::Node(_)));
            assert!(matches!(items[1], Surface::Malformed { .. }));
        }
        other => panic!("expected fragment, got {other:?}"),
    }
}

#[test]
fn deep_tree_hits_depth_guard() {
    let config = RenderConfig::from_json(r#"{"max_depth": 3}"#).unwrap();
    let renderer = Renderer::with_config(CapabilityRegistry::new(), config);
    let mut tree = json!("leaf");
    for _ in 0..10 {
        tree = json!({"div": {"children": tree}});
    }
    let s = renderer.render(&v(tree), &Context::new());
    let mut hit = false;
    s.walk(&mut |n| {
        if matches!(n, Surface::DepthExceeded { limit: 3 }) {
            hit = true;
        }
    });
    assert!(hit);
    assert_eq!(s.text_content(), "");
}

#[test]
fn render_does_not_mutate_context() {
    let c = ctx(json!({"state": {"items": [1, 2]}}));
    let before = c.to_value();
    let _ = Renderer::default().render(
        &v(json!({"for_each": "{{state.items}}", "render_item": {"p": "{{item}}"}})),
        &c,
    );
    assert_eq!(c.to_value(), before);
}

#[test]
fn surface_serializes_to_json() {
    let s = render(json!({"p": {"class": "x", "children": "hi"}}), json!({}));
    assert_eq!(
        s.to_json(),
        json!({"component": "p", "props": {"class": "x"}, "children": ["hi"]})
    );
}
