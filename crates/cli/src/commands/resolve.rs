use tessera_core::DataContext;

use super::{fail, load_data};
use crate::{print_json, OutputFormat};

/// Text output is the bound display string (nothing for a miss); JSON output
/// carries the resolved value itself.
pub(crate) fn cmd_resolve(binding: &str, data: Option<&str>, output: OutputFormat, quiet: bool) {
    let data = load_data(data).unwrap_or_else(|msg| fail(&msg, output, quiet));
    let ctx = DataContext::new(data);

    match output {
        OutputFormat::Text => println!("{}", ctx.resolve_string(binding)),
        OutputFormat::Json => {
            let value = ctx.resolve(binding);
            print_json(&serde_json::json!({
                "binding": binding,
                "found": value.is_some(),
                "value": value.map(serde_json::Value::from),
                "display": ctx.resolve_string(binding),
            }));
        }
    }
}
