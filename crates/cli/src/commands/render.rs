use std::path::Path;

use tessera_core::{DataContext, ValueMap};
use tessera_runtime::{
    load_screen, ActionDispatcher, ComponentRegistry, DirectorySource, DispatchTiming,
    DocumentError, ExpandedNode, FetchOutcome, LiveDataCache, RuntimeConfig, ThemeEngine,
    TreeExpander,
};

use super::{build_endpoint, fail, load_data, runtime};
use crate::{print_json, report_error, OutputFormat};

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_render(
    screen: &str,
    root: &Path,
    data: Option<&str>,
    live: bool,
    fixtures: Option<&Path>,
    config: &RuntimeConfig,
    output: OutputFormat,
    quiet: bool,
) {
    let source = DirectorySource::new(root);

    // Theme and components are optional documents.
    let mut theme = ThemeEngine::new();
    if let Err(e) = theme.load(&source) {
        warn_unless_missing(&e, output, quiet);
    }
    let mut components = ComponentRegistry::new();
    if let Err(e) = components.load(&source) {
        warn_unless_missing(&e, output, quiet);
    }

    let node = load_screen(&source, screen)
        .unwrap_or_else(|e| fail(&format!("error: {}", e), output, quiet));

    let mut data = load_data(data).unwrap_or_else(|msg| fail(&msg, output, quiet));
    if live {
        let live_data = fetch_live(screen, &source, fixtures, config)
            .unwrap_or_else(|msg| fail(&msg, output, quiet));
        // Explicit --data wins over fetched keys.
        for (k, v) in live_data {
            data.entry(k).or_insert(v);
        }
    }

    let ctx = DataContext::new(data);
    let expander = TreeExpander::new(&theme, &components);
    let Some(tree) = expander.expand(&node, &ctx) else {
        if !quiet && output == OutputFormat::Text {
            eprintln!("screen '{}' is hidden by its condition", screen);
        }
        if output == OutputFormat::Json {
            println!("null");
        }
        return;
    };

    match output {
        OutputFormat::Json => match serde_json::to_value(&tree) {
            Ok(value) => print_json(&value),
            Err(e) => fail(&format!("error: {}", e), output, quiet),
        },
        OutputFormat::Text => {
            let mut lines = Vec::new();
            outline(&tree, 0, &mut lines);
            println!("{}", lines.join("\n"));
        }
    }
}

fn fetch_live(
    screen: &str,
    source: &DirectorySource,
    fixtures: Option<&Path>,
    config: &RuntimeConfig,
) -> Result<ValueMap, String> {
    let endpoint = build_endpoint(fixtures, config)?;
    let dispatcher =
        ActionDispatcher::new(endpoint).with_timing(DispatchTiming::from(&config.dispatch));
    let cache = LiveDataCache::new();
    let rt = runtime()?;
    match rt.block_on(cache.fetch(screen, source, &dispatcher, false)) {
        FetchOutcome::Cached(data) | FetchOutcome::Fetched(data) => Ok(data),
        FetchOutcome::Error(message) => Err(format!("error: {}", message)),
    }
}

fn warn_unless_missing(error: &DocumentError, output: OutputFormat, quiet: bool) {
    if !error.is_not_found() {
        report_error(&format!("warning: {}", error), output, quiet);
    }
}

/// `type#id key=value ...`, children indented two spaces per level.
fn outline(node: &ExpandedNode, depth: usize, lines: &mut Vec<String>) {
    let mut line = format!("{}{}", "  ".repeat(depth), node.node_type);
    if let Some(id) = &node.id {
        line.push('#');
        line.push_str(id);
    }
    for (key, value) in &node.props {
        if value.as_object().is_some() {
            continue;
        }
        line.push_str(&format!(" {}={}", key, value));
    }
    lines.push(line);
    for child in &node.children {
        outline(child, depth + 1, lines);
    }
}
