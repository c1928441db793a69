mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tessera_runtime::RuntimeConfig;
use tracing::debug;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Tessera JSON-driven view engine.
#[derive(Parser)]
#[command(name = "tessera", version, about = "Tessera JSON-driven view engine")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Runtime configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a `$.path | transform` binding against a data context
    Resolve {
        /// Binding expression, e.g. '$.user.name | uppercase'
        binding: String,
        /// Context data: a JSON object, inline or as a file path
        #[arg(long)]
        data: Option<String>,
    },

    /// Evaluate a visibility condition against a data context
    Eval {
        /// Condition expression, e.g. '$.count >= 100'
        condition: String,
        /// Context data: a JSON object, inline or as a file path
        #[arg(long)]
        data: Option<String>,
    },

    /// Dispatch an action document and print the resulting context
    Dispatch {
        /// Path to the action JSON file
        action: PathBuf,
        /// Context data: a JSON object, inline or as a file path
        #[arg(long)]
        data: Option<String>,
        /// Canned endpoint responses (JSON object of endpoint -> response)
        /// used instead of real HTTP
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },

    /// Expand a screen document into its bound view tree
    Render {
        /// Screen name (loads <root>/<screen>.json)
        screen: String,
        /// Document directory; overrides [documents] root from the config
        #[arg(long)]
        root: Option<PathBuf>,
        /// Context data: a JSON object, inline or as a file path
        #[arg(long)]
        data: Option<String>,
        /// Run the screen's onLoad action first and render against its data
        #[arg(long)]
        live: bool,
        /// Canned endpoint responses used by --live instead of real HTTP
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let config = load_config(cli.config.as_ref(), cli.output, cli.quiet);

    match cli.command {
        Commands::Resolve { binding, data } => {
            commands::resolve::cmd_resolve(&binding, data.as_deref(), cli.output, cli.quiet);
        }
        Commands::Eval { condition, data } => {
            commands::eval::cmd_eval(&condition, data.as_deref(), cli.output, cli.quiet);
        }
        Commands::Dispatch {
            action,
            data,
            fixtures,
        } => {
            commands::dispatch::cmd_dispatch(
                &action,
                data.as_deref(),
                fixtures.as_deref(),
                &config,
                cli.output,
                cli.quiet,
            );
        }
        Commands::Render {
            screen,
            root,
            data,
            live,
            fixtures,
        } => {
            let root = root.unwrap_or_else(|| config.documents.root.clone());
            commands::render::cmd_render(
                &screen,
                &root,
                data.as_deref(),
                live,
                fixtures.as_deref(),
                &config,
                cli.output,
                cli.quiet,
            );
        }
    }
}

/// Logs go to stderr, filtered by `TESSERA_LOG` (default `warn`).
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("TESSERA_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>, output: OutputFormat, quiet: bool) -> RuntimeConfig {
    let config = match path {
        Some(path) => match RuntimeConfig::load(path) {
            Ok(config) => {
                debug!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                report_error(&format!("error: {}", e), output, quiet);
                process::exit(1);
            }
        },
        None => {
            debug!("no --config given, using defaults");
            RuntimeConfig::default()
        }
    };
    let config = config.with_env_overrides();
    debug!(
        base_url = %config.endpoint.base_url,
        max_attempts = config.dispatch.max_attempts,
        "effective config"
    );
    config
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}

/// Print a JSON value, pretty-printed.
pub(crate) fn print_json(value: &serde_json::Value) {
    let pretty =
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("serialization error: {}", e));
    println!("{}", pretty);
}
