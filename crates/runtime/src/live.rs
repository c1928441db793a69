//! Per-screen cache of live data.
//!
//! A screen's live data is whatever its `onLoad` action leaves in a fresh
//! context. Fetch once, then serve the snapshot to every consumer until it
//! is invalidated.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tessera_core::{DataContext, TaggedValue, ValueMap};
use tracing::{debug, warn};

use crate::dispatch::ActionDispatcher;
use crate::source::{load_screen, DocumentSource};

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Served from the cache without running anything.
    Cached(ValueMap),
    /// The screen's `onLoad` action ran and its result is now cached.
    Fetched(ValueMap),
    Error(String),
}

impl FetchOutcome {
    pub fn data(&self) -> Option<&ValueMap> {
        match self {
            FetchOutcome::Cached(data) | FetchOutcome::Fetched(data) => Some(data),
            FetchOutcome::Error(_) => None,
        }
    }

    pub fn context(&self) -> Option<DataContext<'static>> {
        self.data().cloned().map(DataContext::new)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            FetchOutcome::Error(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Default)]
struct CacheState {
    contexts: HashMap<String, ValueMap>,
    /// screen → elements of every non-empty top-level array in its data
    item_pools: HashMap<String, Vec<TaggedValue>>,
    in_flight: HashSet<String>,
}

#[derive(Default)]
pub struct LiveDataCache {
    state: Mutex<CacheState>,
}

/// Clears a screen's in-flight mark on every exit path.
struct InFlight<'a> {
    cache: &'a LiveDataCache,
    screen: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.cache.lock().in_flight.remove(&self.screen);
    }
}

impl LiveDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn has_cached(&self, screen: &str) -> bool {
        self.lock().contexts.contains_key(screen)
    }

    pub fn cached_context(&self, screen: &str) -> Option<DataContext<'static>> {
        self.lock().contexts.get(screen).cloned().map(DataContext::new)
    }

    pub fn cached_items(&self, screen: &str) -> Vec<TaggedValue> {
        self.lock().item_pools.get(screen).cloned().unwrap_or_default()
    }

    /// Items from every fetched screen. Order across screens is unspecified.
    pub fn all_cached_items(&self) -> Vec<TaggedValue> {
        self.lock().item_pools.values().flatten().cloned().collect()
    }

    pub fn invalidate(&self, screen: &str) {
        let mut state = self.lock();
        state.contexts.remove(screen);
        state.item_pools.remove(screen);
    }

    pub fn invalidate_all(&self) {
        let mut state = self.lock();
        state.contexts.clear();
        state.item_pools.clear();
    }

    /// Live data for `screen`: the cached snapshot, or the result of running
    /// the screen's `onLoad` action against a fresh `{env: {}}` context.
    ///
    /// A screen already being fetched is refused rather than fetched twice.
    pub async fn fetch(
        &self,
        screen: &str,
        source: &dyn DocumentSource,
        dispatcher: &ActionDispatcher,
        force: bool,
    ) -> FetchOutcome {
        let _in_flight = {
            let mut state = self.lock();
            if !force {
                if let Some(data) = state.contexts.get(screen) {
                    return FetchOutcome::Cached(data.clone());
                }
            }
            if !state.in_flight.insert(screen.to_string()) {
                return FetchOutcome::Error(format!("already fetching {}", screen));
            }
            InFlight {
                cache: self,
                screen: screen.to_string(),
            }
        };

        let node = match load_screen(source, screen) {
            Ok(node) => node,
            Err(e) => {
                warn!(screen, error = %e, "could not load screen for live data");
                return FetchOutcome::Error(format!("could not load {}.json: {}", screen, e));
            }
        };
        let Some(on_load) = node.action_prop("onLoad") else {
            return FetchOutcome::Error(format!("screen \"{}\" has no onLoad action", screen));
        };

        let mut seed = ValueMap::new();
        seed.insert("env".to_string(), TaggedValue::Object(ValueMap::new()));
        let mut ctx = DataContext::new(seed);
        dispatcher.dispatch(&on_load, &mut ctx).await;
        let data = ctx.into_data();

        let items: Vec<TaggedValue> = data
            .values()
            .filter_map(TaggedValue::as_array)
            .flatten()
            .cloned()
            .collect();
        debug!(screen, keys = data.len(), items = items.len(), "cached live data");

        let mut state = self.lock();
        state.contexts.insert(screen.to_string(), data.clone());
        state.item_pools.insert(screen.to_string(), items);
        FetchOutcome::Fetched(data)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
