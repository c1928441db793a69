pub(crate) mod dispatch;
pub(crate) mod eval;
pub(crate) mod render;
pub(crate) mod resolve;

use std::path::Path;
use std::process;
use std::sync::Arc;

use tessera_core::{decode, ValueMap};
use tessera_runtime::{Endpoint, HttpEndpoint, RuntimeConfig, StaticEndpoint};
use tracing::debug;

use crate::{report_error, OutputFormat};

/// Report and exit with status 1.
pub(crate) fn fail(msg: &str, output: OutputFormat, quiet: bool) -> ! {
    report_error(msg, output, quiet);
    process::exit(1);
}

/// Context data from `--data`: inline JSON when it starts with `{`,
/// otherwise a path to a JSON file. Absent means an empty context.
pub(crate) fn load_data(arg: Option<&str>) -> Result<ValueMap, String> {
    let Some(arg) = arg else {
        return Ok(ValueMap::new());
    };
    let (bytes, origin) = if arg.trim_start().starts_with('{') {
        (arg.as_bytes().to_vec(), "--data".to_string())
    } else {
        let bytes = std::fs::read(arg)
            .map_err(|e| format!("error: could not read data file '{}': {}", arg, e))?;
        (bytes, arg.to_string())
    };
    let value = decode(&bytes).map_err(|e| format!("error: invalid JSON in {}: {}", origin, e))?;
    value
        .as_object()
        .cloned()
        .ok_or_else(|| format!("error: {} must be a JSON object", origin))
}

/// The endpoint `api` actions call: canned fixtures when given, real HTTP
/// per the config otherwise.
pub(crate) fn build_endpoint(
    fixtures: Option<&Path>,
    config: &RuntimeConfig,
) -> Result<Arc<dyn Endpoint>, String> {
    match fixtures {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| {
                format!("error: could not read fixtures '{}': {}", path.display(), e)
            })?;
            let value: serde_json::Value = serde_json::from_str(&content)
                .map_err(|e| format!("error: invalid JSON in {}: {}", path.display(), e))?;
            if !value.is_object() {
                return Err(format!(
                    "error: fixtures '{}' must map endpoints to responses",
                    path.display()
                ));
            }
            debug!(path = %path.display(), "using fixture endpoint");
            Ok(Arc::new(StaticEndpoint::from_fixtures(value)))
        }
        None => {
            debug!(base_url = %config.endpoint.base_url, "using http endpoint");
            Ok(Arc::new(HttpEndpoint::from_settings(&config.endpoint)))
        }
    }
}

/// Single-threaded runtime for driving the dispatcher.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("error: failed to start async runtime: {}", e))
}
