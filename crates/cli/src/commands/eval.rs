use tessera_core::{evaluate, DataContext};

use super::{fail, load_data};
use crate::{print_json, OutputFormat};

pub(crate) fn cmd_eval(condition: &str, data: Option<&str>, output: OutputFormat, quiet: bool) {
    let data = load_data(data).unwrap_or_else(|msg| fail(&msg, output, quiet));
    let ctx = DataContext::new(data);
    let result = evaluate(condition, &ctx);

    match output {
        OutputFormat::Text => println!("{}", result),
        OutputFormat::Json => print_json(&serde_json::json!({
            "condition": condition,
            "result": result,
        })),
    }
}
