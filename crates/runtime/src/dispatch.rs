//! Action dispatcher.
//!
//! Interprets [`ActionDefinition`] documents against a [`DataContext`].
//! Dispatch never fails: missing fields, unknown action types and
//! unregistered events are silent no-ops, and `api` failures are retried
//! and then logged. The only suspension points are the endpoint call, the
//! retry backoff and the pause between `sequence` steps.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tessera_core::{ActionDefinition, DataContext, TaggedValue, ValueMap};
use tracing::{debug, error, warn};

use crate::config::DispatchSettings;
use crate::endpoint::Endpoint;

/// Receives `navigate` and `present` intents: target screen plus resolved params.
pub type NavigateCallback = Box<dyn Fn(&str, &ValueMap) + Send + Sync>;
pub type DismissCallback = Box<dyn Fn() + Send + Sync>;
/// Receives a `custom` event's payload, every value rendered as a string.
pub type EventHandler = Box<dyn Fn(&BTreeMap<String, String>) + Send + Sync>;

type DispatchFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

// ──────────────────────────────────────────────
// DispatchTiming
// ──────────────────────────────────────────────

/// Retry bound and fixed delays used by `api` and `sequence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchTiming {
    /// Total `api` attempts, including the first.
    pub max_attempts: u32,
    /// Fixed pause between failed `api` attempts. No growth, no jitter.
    pub retry_backoff: Duration,
    /// Pause before every `sequence` step except the first.
    pub sequence_delay: Duration,
}

impl Default for DispatchTiming {
    fn default() -> Self {
        DispatchTiming {
            max_attempts: 3,
            retry_backoff: Duration::from_secs(2),
            sequence_delay: Duration::from_secs(2),
        }
    }
}

impl From<&DispatchSettings> for DispatchTiming {
    fn from(settings: &DispatchSettings) -> Self {
        DispatchTiming {
            max_attempts: settings.max_attempts,
            retry_backoff: settings.retry_backoff(),
            sequence_delay: settings.sequence_delay(),
        }
    }
}

// ──────────────────────────────────────────────
// ActionDispatcher
// ──────────────────────────────────────────────

pub struct ActionDispatcher {
    endpoint: Arc<dyn Endpoint>,
    timing: DispatchTiming,
    on_navigate: Option<NavigateCallback>,
    on_present: Option<NavigateCallback>,
    on_dismiss: Option<DismissCallback>,
    event_handlers: HashMap<String, EventHandler>,
}

impl ActionDispatcher {
    pub fn new(endpoint: Arc<dyn Endpoint>) -> Self {
        ActionDispatcher {
            endpoint,
            timing: DispatchTiming::default(),
            on_navigate: None,
            on_present: None,
            on_dismiss: None,
            event_handlers: HashMap::new(),
        }
    }

    pub fn with_timing(mut self, timing: DispatchTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn timing(&self) -> DispatchTiming {
        self.timing
    }

    pub fn on_navigate(&mut self, callback: impl Fn(&str, &ValueMap) + Send + Sync + 'static) {
        self.on_navigate = Some(Box::new(callback));
    }

    pub fn on_present(&mut self, callback: impl Fn(&str, &ValueMap) + Send + Sync + 'static) {
        self.on_present = Some(Box::new(callback));
    }

    pub fn on_dismiss(&mut self, callback: impl Fn() + Send + Sync + 'static) {
        self.on_dismiss = Some(Box::new(callback));
    }

    /// Register the handler for a `custom` event name. A later registration
    /// for the same name replaces the earlier one.
    pub fn register_event_handler(
        &mut self,
        event: impl Into<String>,
        handler: impl Fn(&BTreeMap<String, String>) + Send + Sync + 'static,
    ) {
        self.event_handlers.insert(event.into(), Box::new(handler));
    }

    pub fn has_event_handler(&self, event: &str) -> bool {
        self.event_handlers.contains_key(event)
    }

    /// Execute one action, and for `sequence` every nested action in order.
    pub async fn dispatch(&self, action: &ActionDefinition, ctx: &mut DataContext<'_>) {
        self.dispatch_boxed(action, ctx).await
    }

    // `sequence` recurses, so the future has to be boxed.
    fn dispatch_boxed<'a, 'p: 'a>(
        &'a self,
        action: &'a ActionDefinition,
        ctx: &'a mut DataContext<'p>,
    ) -> DispatchFuture<'a> {
        Box::pin(async move {
            debug!(action_type = %action.action_type, "dispatching action");
            match action.action_type.as_str() {
                "navigate" => {
                    let Some(screen) = action.screen.as_deref() else {
                        return;
                    };
                    let params = resolve_params(action.params.as_ref(), ctx);
                    if let Some(callback) = &self.on_navigate {
                        callback(screen, &params);
                    }
                }
                "present" => {
                    let Some(screen) = action.screen.as_deref() else {
                        return;
                    };
                    let params = resolve_params(action.params.as_ref(), ctx);
                    if let Some(callback) = &self.on_present {
                        callback(screen, &params);
                    }
                }
                "dismiss" => {
                    if let Some(callback) = &self.on_dismiss {
                        callback();
                    }
                }
                "api" => self.handle_api(action, ctx).await,
                "setState" => {
                    let Some(key) = action.key.as_deref() else {
                        return;
                    };
                    // An absent value leaves the key untouched.
                    if let Some(value) = &action.value {
                        let resolved = ctx.resolve_value(value);
                        ctx.set(key, resolved);
                    }
                }
                "custom" => {
                    let Some(event) = action.event.as_deref() else {
                        return;
                    };
                    let Some(handler) = self.event_handlers.get(event) else {
                        debug!(event, "no handler registered for custom event");
                        return;
                    };
                    let payload = resolve_string_params(action.payload.as_ref(), ctx);
                    handler(&payload);
                }
                "sequence" => {
                    let Some(actions) = action.actions.as_deref() else {
                        return;
                    };
                    for (i, sub) in actions.iter().enumerate() {
                        if i > 0 {
                            tokio::time::sleep(self.timing.sequence_delay).await;
                        }
                        self.dispatch_boxed(sub, ctx).await;
                    }
                }
                other => debug!(action_type = other, "ignoring unknown action type"),
            }
        })
    }

    async fn handle_api(&self, action: &ActionDefinition, ctx: &mut DataContext<'_>) {
        let Some(endpoint) = action.endpoint.as_deref() else {
            warn!("api action missing endpoint");
            return;
        };
        let params = resolve_string_params(action.params.as_ref(), ctx);
        debug!(endpoint, ?params, "api call");

        let attempts = self.timing.max_attempts.max(1);
        for attempt in 1..=attempts {
            match self.endpoint.call(endpoint, &params).await {
                Ok(result) => {
                    if let Some(key) = action.result_key.as_deref() {
                        ctx.set(key, normalize_result(TaggedValue::from(result)));
                    }
                    return;
                }
                Err(e) => {
                    warn!(attempt, attempts, endpoint, error = %e, "api attempt failed");
                    if attempt < attempts {
                        tokio::time::sleep(self.timing.retry_backoff).await;
                    }
                }
            }
        }
        error!(endpoint, attempts, "api call failed after all attempts");
    }
}

fn resolve_params(params: Option<&ValueMap>, ctx: &DataContext<'_>) -> ValueMap {
    let Some(params) = params else {
        return ValueMap::new();
    };
    params
        .iter()
        .map(|(k, v)| (k.clone(), ctx.resolve_value(v)))
        .collect()
}

/// Resolve each value and render it as a string: the scalar string form
/// when there is one, otherwise the display form (`""` for null, compact
/// JSON for containers).
fn resolve_string_params(
    params: Option<&ValueMap>,
    ctx: &DataContext<'_>,
) -> BTreeMap<String, String> {
    let Some(params) = params else {
        return BTreeMap::new();
    };
    params
        .iter()
        .map(|(k, v)| {
            let resolved = ctx.resolve_value(v);
            let text = resolved.as_string().unwrap_or_else(|| resolved.to_string());
            (k.clone(), text)
        })
        .collect()
}

// ──────────────────────────────────────────────
// Result normalization
// ──────────────────────────────────────────────

/// Reshape heterogeneous endpoint results into the `name`/`id`/
/// `artworkUrl100` convention the rest of the runtime binds against.
///
/// - `{feed: {results: X}}` → `X`
/// - `{results: [..]}` → the array, each object element gaining the
///   missing aliases `name`←`trackName`, `id`←`trackId`,
///   `artworkUrl100`←`artworkUrl600`
/// - anything else unchanged
pub fn normalize_result(value: TaggedValue) -> TaggedValue {
    let TaggedValue::Object(map) = &value else {
        return value;
    };

    if let Some(results) = map
        .get("feed")
        .and_then(TaggedValue::as_object)
        .and_then(|feed| feed.get("results"))
    {
        return results.clone();
    }

    if let Some(results) = map.get("results").and_then(TaggedValue::as_array) {
        return TaggedValue::Array(results.iter().cloned().map(normalize_item).collect());
    }

    value
}

fn normalize_item(item: TaggedValue) -> TaggedValue {
    let TaggedValue::Object(mut fields) = item else {
        return item;
    };
    for (alias, source) in [
        ("name", "trackName"),
        ("id", "trackId"),
        ("artworkUrl100", "artworkUrl600"),
    ] {
        if fields.contains_key(alias) {
            continue;
        }
        if let Some(value) = fields.get(source).cloned() {
            fields.insert(alias.to_string(), value);
        }
    }
    TaggedValue::Object(fields)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::StaticEndpoint;
    use serde_json::json;
    use std::sync::Mutex;

    fn tagged(v: serde_json::Value) -> TaggedValue {
        TaggedValue::from(v)
    }

    fn action(v: serde_json::Value) -> ActionDefinition {
        serde_json::from_value(v).unwrap()
    }

    fn ctx(v: serde_json::Value) -> DataContext<'static> {
        DataContext::new(tagged(v).as_object().cloned().unwrap())
    }

    fn dispatcher() -> ActionDispatcher {
        ActionDispatcher::new(Arc::new(StaticEndpoint::new()))
    }

    #[tokio::test]
    async fn navigate_resolves_params() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut d = dispatcher();
        let sink = seen.clone();
        d.on_navigate(move |screen, params| {
            sink.lock().unwrap().push((screen.to_string(), params.clone()));
        });

        let mut c = ctx(json!({ "item": { "trackId": 7 } }));
        d.dispatch(
            &action(json!({
                "actionType": "navigate",
                "screen": "detail",
                "params": { "id": "$.item.trackId", "tab": "episodes", "missing": "$.nope" }
            })),
            &mut c,
        )
        .await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "detail");
        assert_eq!(seen[0].1["id"], TaggedValue::Int(7));
        assert_eq!(seen[0].1["tab"], TaggedValue::from("episodes"));
        assert_eq!(seen[0].1["missing"], TaggedValue::Null);
    }

    #[tokio::test]
    async fn navigate_without_screen_is_a_no_op() {
        let calls = Arc::new(Mutex::new(0));
        let mut d = dispatcher();
        let counter = calls.clone();
        d.on_navigate(move |_, _| *counter.lock().unwrap() += 1);
        let mut c = ctx(json!({}));
        d.dispatch(&action(json!({ "actionType": "navigate" })), &mut c)
            .await;
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn present_and_dismiss_use_their_own_slots() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut d = dispatcher();
        let present_log = log.clone();
        d.on_present(move |screen, params| {
            present_log
                .lock()
                .unwrap()
                .push(format!("present {} {}", screen, params.len()));
        });
        let dismiss_log = log.clone();
        d.on_dismiss(move || dismiss_log.lock().unwrap().push("dismiss".to_string()));

        let mut c = ctx(json!({}));
        d.dispatch(
            &action(json!({ "actionType": "present", "screen": "player" })),
            &mut c,
        )
        .await;
        d.dispatch(&action(json!({ "actionType": "dismiss" })), &mut c)
            .await;
        assert_eq!(*log.lock().unwrap(), vec!["present player 0", "dismiss"]);
    }

    #[tokio::test]
    async fn dismiss_without_callback_is_fine() {
        let mut c = ctx(json!({}));
        dispatcher()
            .dispatch(&action(json!({ "actionType": "dismiss" })), &mut c)
            .await;
    }

    #[tokio::test]
    async fn set_state_resolves_value() {
        let mut c = ctx(json!({ "source": "copied" }));
        let d = dispatcher();
        d.dispatch(
            &action(json!({ "actionType": "setState", "key": "target", "value": "$.source" })),
            &mut c,
        )
        .await;
        d.dispatch(
            &action(json!({ "actionType": "setState", "key": "flag", "value": true })),
            &mut c,
        )
        .await;
        assert_eq!(c.get("target"), Some(&TaggedValue::from("copied")));
        assert_eq!(c.get("flag"), Some(&TaggedValue::Bool(true)));
    }

    // An absent value keeps the previous state rather than clearing it.
    #[tokio::test]
    async fn set_state_without_value_keeps_existing_key() {
        let mut c = ctx(json!({ "query": "rust" }));
        let d = dispatcher();
        d.dispatch(
            &action(json!({ "actionType": "setState", "key": "query" })),
            &mut c,
        )
        .await;
        d.dispatch(
            &action(json!({ "actionType": "setState", "value": 1 })),
            &mut c,
        )
        .await;
        assert_eq!(c.data().len(), 1);
        assert_eq!(c.get("query"), Some(&TaggedValue::from("rust")));
    }

    #[tokio::test]
    async fn set_state_writes_child_scope_only() {
        let root = ctx(json!({ "key": "parent" }));
        let mut child = root.child(ValueMap::new());
        dispatcher()
            .dispatch(
                &action(json!({ "actionType": "setState", "key": "key", "value": "child" })),
                &mut child,
            )
            .await;
        assert_eq!(child.resolve("$.key"), Some(TaggedValue::from("child")));
        assert_eq!(root.get("key"), Some(&TaggedValue::from("parent")));
    }

    #[tokio::test]
    async fn custom_event_payload_is_stringified() {
        let seen = Arc::new(Mutex::new(BTreeMap::new()));
        let mut d = dispatcher();
        let sink = seen.clone();
        d.register_event_handler("playEpisode", move |payload| {
            *sink.lock().unwrap() = payload.clone();
        });

        let mut c = ctx(json!({ "episode": { "url": "https://x/e.mp3", "ms": 1200, "tags": ["a"] } }));
        d.dispatch(
            &action(json!({
                "actionType": "custom",
                "event": "playEpisode",
                "payload": {
                    "url": "$.episode.url",
                    "ms": "$.episode.ms",
                    "tags": "$.episode.tags",
                    "gone": "$.episode.missing",
                    "literal": "static"
                }
            })),
            &mut c,
        )
        .await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen["url"], "https://x/e.mp3");
        assert_eq!(seen["ms"], "1200");
        assert_eq!(seen["tags"], "[\"a\"]");
        assert_eq!(seen["gone"], "");
        assert_eq!(seen["literal"], "static");
    }

    #[tokio::test]
    async fn later_event_registration_replaces_earlier() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut d = dispatcher();
        let first = log.clone();
        d.register_event_handler("ping", move |_| first.lock().unwrap().push("first"));
        let second = log.clone();
        d.register_event_handler("ping", move |_| second.lock().unwrap().push("second"));

        let mut c = ctx(json!({}));
        d.dispatch(
            &action(json!({ "actionType": "custom", "event": "ping" })),
            &mut c,
        )
        .await;
        assert_eq!(*log.lock().unwrap(), vec!["second"]);
    }

    #[tokio::test]
    async fn unknown_action_type_is_a_no_op() {
        let mut c = ctx(json!({ "a": 1 }));
        dispatcher()
            .dispatch(&action(json!({ "actionType": "teleport", "key": "a" })), &mut c)
            .await;
        assert_eq!(c.data().len(), 1);
    }

    #[tokio::test]
    async fn api_without_endpoint_makes_no_call() {
        let endpoint = Arc::new(StaticEndpoint::new());
        let d = ActionDispatcher::new(endpoint.clone());
        let mut c = ctx(json!({}));
        d.dispatch(
            &action(json!({ "actionType": "api", "resultKey": "r" })),
            &mut c,
        )
        .await;
        assert_eq!(endpoint.total_calls(), 0);
        assert!(c.get("r").is_none());
    }

    #[test]
    fn timing_from_settings() {
        let settings = DispatchSettings {
            max_attempts: 5,
            retry_backoff_ms: 10,
            sequence_delay_ms: 0,
        };
        let timing = DispatchTiming::from(&settings);
        assert_eq!(timing.max_attempts, 5);
        assert_eq!(timing.retry_backoff, Duration::from_millis(10));
        assert_eq!(timing.sequence_delay, Duration::ZERO);
    }

    #[test]
    fn normalize_unwraps_feed_results() {
        let raw = tagged(json!({ "feed": { "title": "Top", "results": [{ "id": "1" }] } }));
        assert_eq!(normalize_result(raw), tagged(json!([{ "id": "1" }])));
    }

    #[test]
    fn normalize_adds_aliases_without_overwriting() {
        let raw = tagged(json!({
            "resultCount": 3,
            "results": [
                { "trackName": "X", "trackId": 1, "artworkUrl600": "big.jpg" },
                { "trackName": "Y", "name": "Kept", "artworkUrl100": "small.jpg", "artworkUrl600": "big.jpg" },
                "not an object"
            ]
        }));
        assert_eq!(
            normalize_result(raw),
            tagged(json!([
                { "trackName": "X", "trackId": 1, "artworkUrl600": "big.jpg",
                  "name": "X", "id": 1, "artworkUrl100": "big.jpg" },
                { "trackName": "Y", "name": "Kept", "artworkUrl100": "small.jpg", "artworkUrl600": "big.jpg" },
                "not an object"
            ]))
        );
    }

    #[test]
    fn normalize_leaves_other_shapes_alone() {
        let obj = tagged(json!({ "results": "not an array", "x": 1 }));
        assert_eq!(normalize_result(obj.clone()), obj);
        let arr = tagged(json!([1, 2]));
        assert_eq!(normalize_result(arr.clone()), arr);
        let feed_without_results = tagged(json!({ "feed": { "title": "t" } }));
        assert_eq!(
            normalize_result(feed_without_results.clone()),
            feed_without_results
        );
    }
}
