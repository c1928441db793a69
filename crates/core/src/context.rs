//! Parent-chained data contexts and `$`-path resolution.
//!
//! A [`DataContext`] owns its own bindings and borrows its parent. Root-key
//! lookups search the local bindings first and only then walk up the chain,
//! so a child binding always shadows the same key further up. Writes via
//! [`DataContext::set`] only ever touch the local bindings.
//!
//! Path syntax:
//!
//! ```text
//! $                      whole chain, flattened (child wins)
//! $.podcast.trackName    object key lookup
//! $.items.1              array index lookup
//! $.name | uppercase     base path followed by transforms, left to right
//! ```

use crate::transform;
use crate::value::{TaggedValue, ValueMap};

const PIPE: &str = " | ";

#[derive(Debug, Clone, Default)]
pub struct DataContext<'p> {
    data: ValueMap,
    parent: Option<&'p DataContext<'p>>,
}

impl<'p> DataContext<'p> {
    /// Create a root context with the given bindings.
    pub fn new(data: ValueMap) -> Self {
        DataContext { data, parent: None }
    }

    /// Create a child context that shadows `self` with `bindings`.
    ///
    /// The child reads through to `self` on a miss but never writes to it.
    pub fn child(&self, bindings: ValueMap) -> DataContext<'_> {
        DataContext {
            data: bindings,
            parent: Some(self),
        }
    }

    /// Own bindings, excluding anything inherited from the parent chain.
    pub fn data(&self) -> &ValueMap {
        &self.data
    }

    pub fn into_data(self) -> ValueMap {
        self.data
    }

    pub fn parent(&self) -> Option<&DataContext<'p>> {
        self.parent
    }

    /// Own binding for `key`, without consulting the parent chain.
    pub fn get(&self, key: &str) -> Option<&TaggedValue> {
        self.data.get(key)
    }

    /// Bind `key` in this context's own scope.
    pub fn set(&mut self, key: impl Into<String>, value: TaggedValue) {
        self.data.insert(key.into(), value);
    }

    /// Flatten the whole chain into one map. Nearer scopes win.
    pub fn all_data(&self) -> ValueMap {
        let mut merged = self.parent.map(|p| p.all_data()).unwrap_or_default();
        for (k, v) in &self.data {
            merged.insert(k.clone(), v.clone());
        }
        merged
    }

    /// Resolve a `$` path, applying any `| transform` suffixes.
    ///
    /// Returns `None` when the path does not start with `$`, when a key or
    /// index is missing, or when a path component hits a scalar.
    pub fn resolve(&self, path: &str) -> Option<TaggedValue> {
        let trimmed = path.trim();

        if trimmed.contains(PIPE) {
            let mut parts = trimmed.split(PIPE);
            let base = parts.next()?;
            let mut value = self.resolve_raw_path(base.trim());
            for spec in parts {
                value = transform::apply_transform(spec.trim(), value);
            }
            return value;
        }

        self.resolve_raw_path(trimmed)
    }

    fn resolve_raw_path(&self, path: &str) -> Option<TaggedValue> {
        let key_path = if path == "$" {
            return Some(TaggedValue::Object(self.all_data()));
        } else if let Some(rest) = path.strip_prefix("$.") {
            rest
        } else {
            path.strip_prefix('$')?
        };

        let components: Vec<&str> = key_path.split('.').filter(|c| !c.is_empty()).collect();
        self.lookup(&components).cloned()
    }

    fn lookup(&self, components: &[&str]) -> Option<&TaggedValue> {
        let (first, rest) = components.split_first()?;
        match self.data.get(*first) {
            Some(value) => dig(value, rest),
            None => self.parent?.lookup(components),
        }
    }

    /// Resolve an authored string for display.
    ///
    /// - `\$literal` unescapes to `$literal` and is returned as-is.
    /// - `$path` resolves and returns the value's display form, or `""`.
    /// - Anything else is returned unchanged. There is no interpolation.
    pub fn resolve_string(&self, literal: &str) -> String {
        let trimmed = literal.trim();
        if let Some(escaped) = trimmed.strip_prefix('\\') {
            if escaped.starts_with('$') {
                return escaped.to_string();
            }
        }
        if trimmed.starts_with('$') {
            return self
                .resolve(trimmed)
                .map(|v| v.to_string())
                .unwrap_or_default();
        }
        literal.to_string()
    }

    /// Treat a string value starting with `$` as a binding.
    ///
    /// Only top-level strings are bindings; arrays and objects pass through
    /// untouched, even if they contain `$` strings.
    pub fn resolve_value(&self, value: &TaggedValue) -> TaggedValue {
        match value {
            TaggedValue::String(s) if s.trim_start().starts_with('$') => {
                self.resolve(s).unwrap_or(TaggedValue::Null)
            }
            other => other.clone(),
        }
    }

    /// Write a value back through a binding path, as input fields do.
    ///
    /// `$.key` sets `key`. `$.outer.key` copies this scope's object under
    /// `outer` (or starts a fresh one) and sets `key` in it.
    /// Deeper paths bind their last component at this scope. Paths not
    /// starting with `$.` are ignored.
    pub fn set_binding(&mut self, path: &str, value: TaggedValue) {
        let Some(key_path) = path.trim().strip_prefix("$.") else {
            return;
        };
        let parts: Vec<&str> = key_path.split('.').filter(|c| !c.is_empty()).collect();
        match parts.as_slice() {
            [] => {}
            [key] => self.set(*key, value),
            [outer, key] => {
                let mut inner = self
                    .data
                    .get(*outer)
                    .and_then(TaggedValue::as_object)
                    .cloned()
                    .unwrap_or_default();
                inner.insert((*key).to_string(), value);
                self.set(*outer, TaggedValue::Object(inner));
            }
            [.., last] => self.set(*last, value),
        }
    }
}

fn dig<'v>(value: &'v TaggedValue, path: &[&str]) -> Option<&'v TaggedValue> {
    let Some((first, rest)) = path.split_first() else {
        return Some(value);
    };
    let next = match value {
        TaggedValue::Object(map) => map.get(*first)?,
        TaggedValue::Array(items) => {
            let index = first.parse::<usize>().ok()?;
            items.get(index)?
        }
        _ => return None,
    };
    dig(next, rest)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(v: serde_json::Value) -> DataContext<'static> {
        match TaggedValue::from(v) {
            TaggedValue::Object(map) => DataContext::new(map),
            _ => panic!("context fixture must be an object"),
        }
    }

    fn map(v: serde_json::Value) -> ValueMap {
        TaggedValue::from(v).as_object().cloned().unwrap()
    }

    #[test]
    fn resolves_simple_and_nested_keys() {
        let c = ctx(json!({
            "name": "Test",
            "podcast": { "trackName": "My Podcast", "trackId": 123 }
        }));
        assert_eq!(c.resolve("$.name"), Some(TaggedValue::from("Test")));
        assert_eq!(
            c.resolve("$.podcast.trackName"),
            Some(TaggedValue::from("My Podcast"))
        );
        assert_eq!(
            c.resolve("$.podcast.trackId").and_then(|v| v.as_int()),
            Some(123)
        );
    }

    #[test]
    fn missing_paths_are_absent() {
        let c = ctx(json!({ "name": "x" }));
        assert_eq!(c.resolve("$.nonexistent"), None);
        assert_eq!(c.resolve("$.name.deeper"), None);
        assert_eq!(c.resolve("name"), None);
        assert_eq!(c.resolve("$."), None);
    }

    #[test]
    fn array_index_lookup() {
        let c = ctx(json!({ "items": ["a", "b", "c"] }));
        assert_eq!(c.resolve("$.items.1"), Some(TaggedValue::from("b")));
        assert_eq!(c.resolve("$.items.9"), None);
        assert_eq!(c.resolve("$.items.x"), None);
        assert_eq!(c.resolve("$.items.-1"), None);
    }

    #[test]
    fn dollar_without_dot_addresses_root_keys() {
        let c = ctx(json!({ "name": "x" }));
        assert_eq!(c.resolve("$name"), Some(TaggedValue::from("x")));
    }

    #[test]
    fn bare_dollar_flattens_chain() {
        let parent = ctx(json!({ "a": 1, "shared": "parent" }));
        let child = parent.child(map(json!({ "b": 2, "shared": "child" })));
        assert_eq!(
            child.resolve("$"),
            Some(TaggedValue::from(json!({ "a": 1, "b": 2, "shared": "child" })))
        );
    }

    #[test]
    fn child_reads_through_and_shadows() {
        let parent = ctx(json!({ "global": "value", "key": "parent" }));
        let child = parent.child(map(json!({ "local": "child_value", "key": "child" })));
        assert_eq!(child.resolve("$.local"), Some(TaggedValue::from("child_value")));
        assert_eq!(child.resolve("$.global"), Some(TaggedValue::from("value")));
        assert_eq!(child.resolve("$.key"), Some(TaggedValue::from("child")));

        let fresh = parent.child(ValueMap::new());
        assert_eq!(fresh.resolve("$.key"), Some(TaggedValue::from("parent")));
    }

    #[test]
    fn shadowing_is_by_root_key_only() {
        let parent = ctx(json!({ "obj": { "a": 1, "b": 2 } }));
        let child = parent.child(map(json!({ "obj": { "a": 10 } })));
        assert_eq!(child.resolve("$.obj.a"), Some(TaggedValue::Int(10)));
        assert_eq!(child.resolve("$.obj.b"), None);
    }

    #[test]
    fn grandchild_chain() {
        let root = ctx(json!({ "a": 1 }));
        let mid = root.child(map(json!({ "b": 2 })));
        let leaf = mid.child(map(json!({ "c": 3 })));
        assert_eq!(leaf.resolve("$.a"), Some(TaggedValue::Int(1)));
        assert_eq!(leaf.resolve("$.b"), Some(TaggedValue::Int(2)));
        assert_eq!(leaf.resolve("$.c"), Some(TaggedValue::Int(3)));
    }

    #[test]
    fn set_on_child_is_isolated() {
        let parent = ctx(json!({ "key": "parent" }));
        let mut child = parent.child(ValueMap::new());
        child.set("key", TaggedValue::from("child"));
        assert_eq!(child.resolve("$.key"), Some(TaggedValue::from("child")));
        assert_eq!(parent.resolve("$.key"), Some(TaggedValue::from("parent")));
    }

    #[test]
    fn transform_pipeline_applies_left_to_right() {
        let c = ctx(json!({ "name": "hello", "title": "Hello World" }));
        assert_eq!(
            c.resolve("$.name | uppercase"),
            Some(TaggedValue::from("HELLO"))
        );
        assert_eq!(
            c.resolve("$.title | truncate:5 | uppercase"),
            Some(TaggedValue::from("HELLO\u{2026}"))
        );
        assert_eq!(
            c.resolve("$.missing | default:N/A"),
            Some(TaggedValue::from("N/A"))
        );
    }

    #[test]
    fn resolve_string_forms() {
        let c = ctx(json!({ "name": "Hello", "count": 3 }));
        assert_eq!(c.resolve_string("$.name"), "Hello");
        assert_eq!(c.resolve_string("$.count"), "3");
        assert_eq!(c.resolve_string("literal"), "literal");
        assert_eq!(c.resolve_string("\\$escaped"), "$escaped");
        assert_eq!(c.resolve_string("$.missing"), "");
        assert_eq!(c.resolve_string("  spaced "), "  spaced ");
    }

    #[test]
    fn resolve_value_only_binds_strings() {
        let c = ctx(json!({ "id": 123 }));
        assert_eq!(
            c.resolve_value(&TaggedValue::from("$.id")),
            TaggedValue::Int(123)
        );
        assert_eq!(
            c.resolve_value(&TaggedValue::from("  $.id")),
            TaggedValue::Int(123)
        );
        assert_eq!(
            c.resolve_value(&TaggedValue::from("$.missing")),
            TaggedValue::Null
        );
        assert_eq!(
            c.resolve_value(&TaggedValue::from("plain")),
            TaggedValue::from("plain")
        );
        let nested = TaggedValue::from(json!(["$.id"]));
        assert_eq!(c.resolve_value(&nested), nested);
    }

    #[test]
    fn set_binding_writes_nested_objects() {
        let mut c = ctx(json!({ "env": { "other": 1 } }));
        c.set_binding("$.env.searchQuery", TaggedValue::from("rust"));
        assert_eq!(
            c.resolve("$.env"),
            Some(TaggedValue::from(json!({ "other": 1, "searchQuery": "rust" })))
        );

        c.set_binding("$.query", TaggedValue::from("q"));
        assert_eq!(c.resolve("$.query"), Some(TaggedValue::from("q")));

        c.set_binding("$.a.b.c", TaggedValue::Int(1));
        assert_eq!(c.get("c"), Some(&TaggedValue::Int(1)));

        c.set_binding("query", TaggedValue::from("ignored"));
        assert_eq!(c.resolve("$.query"), Some(TaggedValue::from("q")));
    }
}
