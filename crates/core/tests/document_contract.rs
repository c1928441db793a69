//! Wire-format contract tests.
//!
//! Authored documents are the interface between content authors and the
//! engine, so these tests pin the codec round trip and the end-to-end
//! behavior of bindings, transforms and conditions over decoded documents.

use tessera_core::{
    decode, encode, evaluate, ActionDefinition, ComponentDefinition, DataContext, TaggedValue,
    ValueMap, ViewNode,
};

fn sample_values() -> Vec<TaggedValue> {
    let mut inner = ValueMap::new();
    inner.insert("name".into(), TaggedValue::from("test"));
    inner.insert("count".into(), TaggedValue::Int(42));
    inner.insert("ratio".into(), TaggedValue::Double(0.25));
    inner.insert("whole".into(), TaggedValue::Double(3.0));
    inner.insert("active".into(), TaggedValue::Bool(true));
    inner.insert("nothing".into(), TaggedValue::Null);
    inner.insert(
        "items".into(),
        TaggedValue::Array(vec![TaggedValue::from("a"), TaggedValue::from("b")]),
    );

    let mut outer = ValueMap::new();
    outer.insert("inner".into(), TaggedValue::Object(inner.clone()));
    outer.insert("empty".into(), TaggedValue::Object(ValueMap::new()));
    outer.insert(
        "mixed".into(),
        TaggedValue::Array(vec![
            TaggedValue::Int(-1),
            TaggedValue::Object(inner),
            TaggedValue::Array(vec![]),
        ]),
    );

    vec![
        TaggedValue::from("42"),
        TaggedValue::from(""),
        TaggedValue::Int(i64::MIN),
        TaggedValue::Int(i64::MAX),
        TaggedValue::Double(-1.5e-7),
        TaggedValue::Double(1e300),
        TaggedValue::Bool(false),
        TaggedValue::Null,
        TaggedValue::Array(vec![]),
        TaggedValue::Object(outer),
    ]
}

#[test]
fn codec_round_trip_for_every_variant() {
    for value in sample_values() {
        let bytes = encode(&value).expect("encodable");
        let decoded = decode(&bytes).expect("decodable");
        assert_eq!(decoded, value, "round trip of {}", String::from_utf8_lossy(&bytes));
    }
}

#[test]
fn string_typed_number_stays_a_string() {
    assert_eq!(decode(b"\"42\"").unwrap(), TaggedValue::from("42"));
    assert_eq!(decode(b"42").unwrap(), TaggedValue::Int(42));
}

#[test]
fn view_node_round_trips_through_json() {
    let raw = r#"{
        "type": "screen",
        "id": "home",
        "style": "page",
        "inlineStyle": {"padding": 16},
        "condition": "$.user | exists",
        "props": {
            "onLoad": {"actionType": "api", "endpoint": "/search", "resultKey": "results"}
        },
        "children": [
            {"type": "text", "props": {"content": "$.user.name | uppercase"}}
        ]
    }"#;
    let node: ViewNode = serde_json::from_str(raw).unwrap();
    let encoded = serde_json::to_string(&node).unwrap();
    let again: ViewNode = serde_json::from_str(&encoded).unwrap();
    assert_eq!(again, node);
    assert_eq!(
        node.action_prop("onLoad").and_then(|a| a.result_key),
        Some("results".to_string())
    );
}

#[test]
fn action_definition_round_trips_through_tagged_value() {
    let raw = br#"{"actionType":"custom","event":"openUrl","payload":{"url":"$.url"}}"#;
    let value = decode(raw).unwrap();
    let action = ActionDefinition::from_value(&value).unwrap();
    assert_eq!(action.event.as_deref(), Some("openUrl"));

    let back = TaggedValue::from(serde_json::to_value(&action).unwrap());
    assert_eq!(back, value);
}

#[test]
fn component_body_binds_parameters() {
    let raw = r#"{"parameters":["podcast"],"body":{"type":"text","props":{"content":"$.podcast.name"}}}"#;
    let comp: ComponentDefinition = serde_json::from_str(raw).unwrap();

    let root = DataContext::default();
    let mut bindings = ValueMap::new();
    let mut podcast = ValueMap::new();
    podcast.insert("name".into(), TaggedValue::from("Hard Fork"));
    bindings.insert(comp.parameters[0].clone(), TaggedValue::Object(podcast));
    let scope = root.child(bindings);

    let content = comp.body.string_prop("content").unwrap();
    assert_eq!(scope.resolve_string(&content), "Hard Fork");
}

#[test]
fn list_item_scopes_see_item_and_index() {
    let mut data = ValueMap::new();
    data.insert(
        "episodes".into(),
        TaggedValue::Array(vec![TaggedValue::from("one"), TaggedValue::from("two")]),
    );
    data.insert("highlight".into(), TaggedValue::Int(1));
    let root = DataContext::new(data);

    let items = root.resolve("$.episodes").unwrap();
    let highlighted: Vec<bool> = items
        .as_array()
        .unwrap()
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let mut bindings = ValueMap::new();
            bindings.insert("item".into(), item.clone());
            bindings.insert("index".into(), TaggedValue::Int(index as i64));
            let scope = root.child(bindings);
            evaluate("$.index == $.highlight", &scope)
        })
        .collect();
    assert_eq!(highlighted, vec![false, true]);
}
