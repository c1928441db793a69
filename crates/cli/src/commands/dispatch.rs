use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tessera_core::{decode, ActionDefinition, DataContext, TaggedValue};
use tessera_runtime::{ActionDispatcher, DispatchTiming, RuntimeConfig};

use super::{build_endpoint, fail, load_data, runtime};
use crate::{print_json, OutputFormat};

/// Something the dispatcher reported to its host during a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Intent {
    Navigate {
        screen: String,
        params: serde_json::Value,
    },
    Present {
        screen: String,
        params: serde_json::Value,
    },
    Dismiss,
    Event {
        event: String,
        payload: serde_json::Value,
    },
}

impl Intent {
    fn describe(&self) -> String {
        match self {
            Intent::Navigate { screen, params } => format!("navigate {} {}", screen, params),
            Intent::Present { screen, params } => format!("present {} {}", screen, params),
            Intent::Dismiss => "dismiss".to_string(),
            Intent::Event { event, payload } => format!("event {} {}", event, payload),
        }
    }
}

type IntentLog = Arc<Mutex<Vec<Intent>>>;

pub(crate) fn cmd_dispatch(
    action_path: &Path,
    data: Option<&str>,
    fixtures: Option<&Path>,
    config: &RuntimeConfig,
    output: OutputFormat,
    quiet: bool,
) {
    let bytes = std::fs::read(action_path).unwrap_or_else(|e| {
        fail(
            &format!("error: could not read '{}': {}", action_path.display(), e),
            output,
            quiet,
        )
    });
    let value = decode(&bytes).unwrap_or_else(|e| {
        fail(
            &format!("error: invalid JSON in {}: {}", action_path.display(), e),
            output,
            quiet,
        )
    });
    let Some(action) = ActionDefinition::from_value(&value) else {
        fail(
            &format!(
                "error: {} is not an action (missing actionType?)",
                action_path.display()
            ),
            output,
            quiet,
        );
    };

    let data = load_data(data).unwrap_or_else(|msg| fail(&msg, output, quiet));
    let endpoint = build_endpoint(fixtures, config).unwrap_or_else(|msg| fail(&msg, output, quiet));
    let rt = runtime().unwrap_or_else(|msg| fail(&msg, output, quiet));

    let intents: IntentLog = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = ActionDispatcher::new(endpoint)
        .with_timing(DispatchTiming::from(&config.dispatch));
    record_intents(&mut dispatcher, &action, &intents);

    let mut ctx = DataContext::new(data);
    rt.block_on(dispatcher.dispatch(&action, &mut ctx));

    let context = serde_json::Value::from(TaggedValue::Object(ctx.into_data()));
    let intents = intents
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();

    match output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "context": context,
            "intents": intents,
        })),
        OutputFormat::Text => {
            print_json(&context);
            if !quiet {
                for intent in &intents {
                    println!("{}", intent.describe());
                }
            }
        }
    }
}

/// Route navigation callbacks, and a handler for every custom event name
/// the action tree mentions, into the intent log.
fn record_intents(dispatcher: &mut ActionDispatcher, action: &ActionDefinition, log: &IntentLog) {
    let sink = log.clone();
    dispatcher.on_navigate(move |screen, params| {
        push(
            &sink,
            Intent::Navigate {
                screen: screen.to_string(),
                params: TaggedValue::Object(params.clone()).into(),
            },
        );
    });
    let sink = log.clone();
    dispatcher.on_present(move |screen, params| {
        push(
            &sink,
            Intent::Present {
                screen: screen.to_string(),
                params: TaggedValue::Object(params.clone()).into(),
            },
        );
    });
    let sink = log.clone();
    dispatcher.on_dismiss(move || push(&sink, Intent::Dismiss));

    let mut events = BTreeSet::new();
    collect_events(action, &mut events);
    for event in events {
        let sink = log.clone();
        let name = event.clone();
        dispatcher.register_event_handler(event, move |payload| {
            push(
                &sink,
                Intent::Event {
                    event: name.clone(),
                    payload: serde_json::json!(payload),
                },
            );
        });
    }
}

fn collect_events(action: &ActionDefinition, events: &mut BTreeSet<String>) {
    if action.action_type == "custom" {
        if let Some(event) = &action.event {
            events.insert(event.clone());
        }
    }
    for sub in action.actions.iter().flatten() {
        collect_events(sub, events);
    }
}

fn push(log: &IntentLog, intent: Intent) {
    log.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(intent);
}
