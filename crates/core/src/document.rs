//! Authored document shapes.
//!
//! Props are stored as raw [`TaggedValue`]s. Nested structures (an action
//! on a button, a list's `itemTemplate`, a tab bar's `tabs`) are decoded
//! into typed views on demand, and an undecodable prop is reported as
//! absent rather than as an error.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::value::{TaggedValue, ValueMap};

/// A node in a declarative view tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_style: Option<ValueMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ViewNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<ValueMap>,
}

/// A declarative instruction, discriminated by `actionType`.
///
/// Every field other than `action_type` is optional; which ones matter
/// depends on the action type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<ValueMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<TaggedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ValueMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionDefinition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabDefinition {
    pub title: String,
    pub icon: String,
    pub screen: String,
}

/// A named, parameterized subtree. Parameters are bound as top-level keys
/// of a child context when the component is instantiated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    pub parameters: Vec<String>,
    pub body: ViewNode,
}

/// Decode a tagged value into a typed document view, or `None`.
pub fn decode_as<T: DeserializeOwned>(value: &TaggedValue) -> Option<T> {
    serde_json::from_value(value.to_json()).ok()
}

/// Decode an object-valued tagged value; anything else is `None`.
fn decode_object<T: DeserializeOwned>(value: &TaggedValue) -> Option<T> {
    value.as_object()?;
    decode_as(value)
}

impl ActionDefinition {
    pub fn new(action_type: impl Into<String>) -> Self {
        ActionDefinition {
            action_type: action_type.into(),
            ..Default::default()
        }
    }

    /// Decode an action from a tagged object value.
    pub fn from_value(value: &TaggedValue) -> Option<Self> {
        decode_object(value)
    }
}

impl ViewNode {
    pub fn new(node_type: impl Into<String>) -> Self {
        ViewNode {
            node_type: node_type.into(),
            id: None,
            style: None,
            inline_style: None,
            condition: None,
            children: None,
            props: None,
        }
    }

    /// Decode a node from a tagged object value.
    pub fn from_value(value: &TaggedValue) -> Option<Self> {
        decode_object(value)
    }

    pub fn prop(&self, key: &str) -> Option<&TaggedValue> {
        self.props.as_ref()?.get(key)
    }

    pub fn string_prop(&self, key: &str) -> Option<String> {
        self.prop(key)?.as_string()
    }

    pub fn int_prop(&self, key: &str) -> Option<i64> {
        self.prop(key)?.as_int()
    }

    pub fn double_prop(&self, key: &str) -> Option<f64> {
        self.prop(key)?.as_double()
    }

    pub fn bool_prop(&self, key: &str) -> Option<bool> {
        self.prop(key)?.as_bool()
    }

    /// A nested node stored under `key` (a button label, a list template).
    pub fn node_prop(&self, key: &str) -> Option<ViewNode> {
        ViewNode::from_value(self.prop(key)?)
    }

    /// Nested nodes stored as an array under `key`. Elements that are not
    /// decodable nodes are dropped.
    pub fn node_array_prop(&self, key: &str) -> Option<Vec<ViewNode>> {
        let items = self.prop(key)?.as_array()?;
        Some(items.iter().filter_map(ViewNode::from_value).collect())
    }

    pub fn action_prop(&self, key: &str) -> Option<ActionDefinition> {
        ActionDefinition::from_value(self.prop(key)?)
    }

    /// The `tabs` prop of a tab view. Undecodable entries are dropped.
    pub fn tabs_prop(&self) -> Option<Vec<TabDefinition>> {
        let items = self.prop("tabs")?.as_array()?;
        Some(items.iter().filter_map(decode_object::<TabDefinition>).collect())
    }

    pub fn children(&self) -> &[ViewNode] {
        self.children.as_deref().unwrap_or_default()
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
