//! Named, parameterized subtrees.
//!
//! Components are loaded from the `components` document:
//!
//! ```json
//! { "components": { "podcastCard": { "parameters": ["podcast"], "body": { ... } } } }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use tessera_core::{ComponentDefinition, DataContext, ValueMap, ViewNode};
use tracing::debug;

use crate::error::DocumentError;
use crate::source::{load_json, DocumentSource, COMPONENTS_DOCUMENT};

#[derive(Deserialize)]
struct ComponentsFile {
    components: BTreeMap<String, ComponentDefinition>,
}

#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: BTreeMap<String, ComponentDefinition>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registry contents with the `components` document.
    ///
    /// On any error the registry is left unchanged. Returns the number of
    /// components loaded.
    pub fn load(&mut self, source: &dyn DocumentSource) -> Result<usize, DocumentError> {
        let file: ComponentsFile = load_json(source, COMPONENTS_DOCUMENT)?;
        self.components = file.components;
        debug!(count = self.components.len(), "loaded components");
        Ok(self.components.len())
    }

    pub fn register(&mut self, name: impl Into<String>, definition: ComponentDefinition) {
        self.components.insert(name.into(), definition);
    }

    pub fn get(&self, name: &str) -> Option<&ComponentDefinition> {
        self.components.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn clear(&mut self) {
        self.components.clear();
    }

    /// Instantiate a component: its body plus a child context binding each
    /// supplied parameter (resolved against `ctx`) as a top-level key.
    ///
    /// Every supplied parameter is bound, declared or not; declared
    /// parameters that are not supplied stay unbound.
    pub fn resolve<'c>(
        &self,
        name: &str,
        parameters: &ValueMap,
        ctx: &'c DataContext<'_>,
    ) -> Option<(ViewNode, DataContext<'c>)> {
        let component = self.components.get(name)?;
        let bindings: ValueMap = parameters
            .iter()
            .map(|(k, v)| (k.clone(), ctx.resolve_value(v)))
            .collect();
        Some((component.body.clone(), ctx.child(bindings)))
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
