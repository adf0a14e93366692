mod config;
mod generate;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use schemagen_codegen::{AccessorRenderer, DslRenderer, Target, TypeMapper, TypeScriptRenderer};
use schemagen_core::{evaluate, infer, Descriptor, EvaluateOptions, DEFAULT_MAX_DEPTH};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Typed TypeScript accessors from config schemas.
#[derive(Parser)]
#[command(
    name = "schemagen",
    version,
    about = "Typed TypeScript accessors from config schemas"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log pipeline steps to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate client and declaration modules from a config manifest
    Generate {
        /// Path to the manifest JSON file
        #[arg(long)]
        manifest: PathBuf,
        /// Comma-separated targets (node-ts, react-ts)
        #[arg(long, default_value = "react-ts")]
        targets: String,
        /// Path to the output configuration file
        #[arg(long, default_value = config::DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },

    /// Evaluate schema text and show what it renders to
    Eval {
        /// Schema text, or a path to it with --file
        schema: String,
        /// Treat SCHEMA as a file path
        #[arg(long)]
        file: bool,
        /// Field name used in rendered fields
        #[arg(long, default_value = "value")]
        field_name: String,
        /// Maximum number of syntax nodes the schema may contain
        #[arg(long, default_value_t = schemagen_core::DEFAULT_MAX_NODES)]
        max_nodes: usize,
    },

    /// Infer a schema from a sample JSON document
    Infer {
        /// Path to the JSON file
        file: PathBuf,
        /// Field name used in rendered fields
        #[arg(long, default_value = "value")]
        field_name: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Generate {
            manifest,
            targets,
            config,
        } => {
            generate::cmd_generate(&manifest, &targets, &config, cli.output, cli.quiet);
        }
        Commands::Eval {
            schema,
            file,
            field_name,
            max_nodes,
        } => {
            cmd_eval(&schema, file, &field_name, max_nodes, cli.output, cli.quiet);
        }
        Commands::Infer { file, field_name } => {
            cmd_infer(&file, &field_name, cli.output, cli.quiet);
        }
    }
}

/// Logs go to stderr so generated text on stdout stays clean. `RUST_LOG`
/// takes precedence over the flags.
fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_eval(
    schema: &str,
    from_file: bool,
    field_name: &str,
    max_nodes: usize,
    output: OutputFormat,
    quiet: bool,
) {
    let text = if from_file {
        match std::fs::read_to_string(schema) {
            Ok(s) => s,
            Err(e) => {
                let msg = format!("error reading '{}': {}", schema, e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
        }
    } else {
        schema.to_owned()
    };

    let options = EvaluateOptions {
        max_nodes,
        max_depth: DEFAULT_MAX_DEPTH,
    };
    match evaluate(&text, &options) {
        Ok(d) => print_rendered(&d, field_name, output, quiet),
        Err(e) => {
            match output {
                OutputFormat::Json => {
                    let err_json = serde_json::to_string_pretty(&e.to_json_value())
                        .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", e));
                    eprintln!("{}", err_json);
                }
                OutputFormat::Text => {
                    if !quiet {
                        eprintln!("{}", e);
                    }
                }
            }
            process::exit(1);
        }
    }
}

fn cmd_infer(path: &Path, field_name: &str, output: OutputFormat, quiet: bool) {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    let sample: serde_json::Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error parsing JSON in '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    print_rendered(&infer(&sample), field_name, output, quiet);
}

/// Canonical DSL, both static types and the accessor for `d`.
fn print_rendered(d: &Descriptor, field_name: &str, output: OutputFormat, quiet: bool) {
    let dsl = DslRenderer.resolve(d);
    let types = TypeScriptRenderer::new(field_name);
    let typed = types.render_field(d);
    let raw = types.with_target(Target::Raw).render_field(d);
    let accessor = AccessorRenderer::new(field_name).render_field(d);

    match output {
        OutputFormat::Text => {
            if quiet {
                println!("{}", dsl);
                return;
            }
            println!("schema:   {}", dsl);
            println!("type:     {}", typed);
            println!("raw:      {}", raw);
            println!("accessor: {}", accessor);
        }
        OutputFormat::Json => {
            let report = serde_json::json!({
                "schema": dsl,
                "type": typed,
                "raw": raw,
                "accessor": accessor,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&report).unwrap_or_default()
            );
        }
    }
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
