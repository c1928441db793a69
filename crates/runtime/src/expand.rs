//! Headless tree expansion.
//!
//! Walks a [`ViewNode`] against a [`DataContext`] the way a renderer would:
//! conditions decide visibility, styles are merged, string props are bound,
//! lists repeat their template per item, and component references are
//! instantiated. The result is a plain tree a host (or a test) can inspect
//! without any UI toolkit.

use serde::Serialize;
use tessera_core::{evaluate, DataContext, TaggedValue, ValueMap, ViewNode};
use tracing::warn;

use crate::component::ComponentRegistry;
use crate::theme::ThemeEngine;

/// Props whose strings are display text: bound with `resolve_string`, so a
/// failed binding is `""` and literals pass through.
const TEXT_PROPS: [&str; 4] = ["content", "source", "placeholder", "title"];

/// Props holding a binding path for the host to read or write later. Kept
/// as authored.
const PATH_PROPS: [&str; 2] = ["binding", "items"];

/// Props consumed by expansion itself.
const STRUCTURAL_PROPS: [&str; 3] = ["itemTemplate", "label", "parameters"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "ValueMap::is_empty")]
    pub style: ValueMap,
    #[serde(skip_serializing_if = "ValueMap::is_empty")]
    pub props: ValueMap,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ExpandedNode>,
}

impl ExpandedNode {
    /// Depth-first search by node id.
    pub fn find(&self, id: &str) -> Option<&ExpandedNode> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Total node count, including this one.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(ExpandedNode::node_count)
            .sum::<usize>()
    }
}

pub struct TreeExpander<'r> {
    theme: &'r ThemeEngine,
    components: &'r ComponentRegistry,
}

impl<'r> TreeExpander<'r> {
    pub fn new(theme: &'r ThemeEngine, components: &'r ComponentRegistry) -> Self {
        TreeExpander { theme, components }
    }

    /// Expand a node, or `None` when its condition is false.
    ///
    /// A component that uses itself, directly or through other components,
    /// expands to an empty instance at the point where it re-enters.
    pub fn expand(&self, node: &ViewNode, ctx: &DataContext<'_>) -> Option<ExpandedNode> {
        self.expand_node(node, ctx, &mut Vec::new())
    }

    fn expand_node(
        &self,
        node: &ViewNode,
        ctx: &DataContext<'_>,
        active: &mut Vec<String>,
    ) -> Option<ExpandedNode> {
        if let Some(condition) = node.condition.as_deref() {
            if !evaluate(condition, ctx) {
                return None;
            }
        }

        let mut expanded = ExpandedNode {
            node_type: node.node_type.clone(),
            id: node.id.clone(),
            style: self
                .theme
                .merged_style(node.style.as_deref(), node.inline_style.as_ref()),
            props: bind_props(node, ctx),
            children: Vec::new(),
        };

        expanded.children = match node.node_type.as_str() {
            "list" => self.expand_list(node, ctx, active),
            "component" => self.expand_component(node, ctx, active),
            "button" => match node.node_prop("label") {
                Some(label) => self.expand_node(&label, ctx, active).into_iter().collect(),
                None => self.expand_children(node, ctx, active),
            },
            _ => self.expand_children(node, ctx, active),
        };

        Some(expanded)
    }

    fn expand_children(
        &self,
        node: &ViewNode,
        ctx: &DataContext<'_>,
        active: &mut Vec<String>,
    ) -> Vec<ExpandedNode> {
        node.children()
            .iter()
            .filter_map(|child| self.expand_node(child, ctx, active))
            .collect()
    }

    /// One expansion of `itemTemplate` per element of the `items` binding,
    /// each in a child scope binding `item` and `index`.
    fn expand_list(
        &self,
        node: &ViewNode,
        ctx: &DataContext<'_>,
        active: &mut Vec<String>,
    ) -> Vec<ExpandedNode> {
        let Some(template) = node.node_prop("itemTemplate") else {
            return Vec::new();
        };
        let Some(items) = node.string_prop("items").and_then(|path| ctx.resolve(&path)) else {
            return Vec::new();
        };
        let Some(items) = items.as_array() else {
            return Vec::new();
        };

        let mut expanded = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let mut bindings = ValueMap::new();
            bindings.insert("item".to_string(), item.clone());
            bindings.insert("index".to_string(), TaggedValue::Int(index as i64));
            let scope = ctx.child(bindings);
            expanded.extend(self.expand_node(&template, &scope, active));
        }
        expanded
    }

    fn expand_component(
        &self,
        node: &ViewNode,
        ctx: &DataContext<'_>,
        active: &mut Vec<String>,
    ) -> Vec<ExpandedNode> {
        let Some(name) = node.string_prop("name") else {
            return Vec::new();
        };
        if active.contains(&name) {
            warn!(
                component = %name,
                chain = ?active,
                "recursive component reference skipped"
            );
            return Vec::new();
        }
        let parameters = node
            .prop("parameters")
            .and_then(TaggedValue::as_object)
            .cloned()
            .unwrap_or_default();
        let Some((body, scope)) = self.components.resolve(&name, &parameters, ctx) else {
            return Vec::new();
        };

        active.push(name);
        let expanded = self.expand_node(&body, &scope, active);
        active.pop();
        expanded.into_iter().collect()
    }
}

fn bind_props(node: &ViewNode, ctx: &DataContext<'_>) -> ValueMap {
    let Some(props) = node.props.as_ref() else {
        return ValueMap::new();
    };
    let mut bound = ValueMap::new();
    for (key, value) in props {
        let key_str = key.as_str();
        if STRUCTURAL_PROPS.contains(&key_str) && value.as_object().is_some() {
            continue;
        }
        let resolved = match value {
            TaggedValue::String(s) if TEXT_PROPS.contains(&key_str) => {
                TaggedValue::String(ctx.resolve_string(s))
            }
            TaggedValue::String(_) if PATH_PROPS.contains(&key_str) => value.clone(),
            TaggedValue::String(_) => ctx.resolve_value(value),
            _ => value.clone(),
        };
        bound.insert(key.clone(), resolved);
    }
    bound
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
