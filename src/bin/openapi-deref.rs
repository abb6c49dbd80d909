//! OpenAPI Dereferencer CLI
//!
//! Flattens an OpenAPI document by inlining every `$ref` and pruning unused components.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use openapi_deref::{
    dereference_file, render_document, DerefConfig, DerefError, DerefOptions, DocumentFormat,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "openapi-deref")]
#[command(about = "Inline every $ref of an OpenAPI document and prune unused components")]
#[command(version)]
struct Cli {
    /// Input document (YAML or JSON)
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Config file (YAML or JSON) with input, output and options
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Output format: yaml or json (default: from output/input extension)
    #[arg(long)]
    format: Option<String>,

    /// Overwrite the root `openapi` version string
    #[arg(long)]
    openapi_version: Option<String>,

    /// Allow fetching http(s) $ref targets
    #[arg(long)]
    allow_http: bool,

    /// Only resolve refs inside the input document
    #[arg(long)]
    no_external_refs: bool,

    /// Don't annotate inlined objects with x-resolved-from
    #[arg(long)]
    no_resolved_from: bool,

    /// Replace `required` lists instead of unioning them when merging $ref siblings
    #[arg(long)]
    no_merge_required: bool,

    /// Leave circular $refs as-is instead of marking them with x-circular-ref
    #[arg(long)]
    no_circular_placeholder: bool,

    /// Maximum length of a $ref chain
    #[arg(long)]
    max_depth: Option<usize>,

    /// Keep unused components
    #[arg(long)]
    no_prune: bool,

    /// Component section eligible for pruning (repeatable; replaces the default set)
    #[arg(long = "section", value_name = "NAME")]
    sections: Vec<String>,

    /// Don't print the summary
    #[arg(long, short)]
    quiet: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(long, short, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), u8> {
    let config = match &cli.config {
        Some(path) => DerefConfig::from_file(path).map_err(report)?,
        None => DerefConfig::default(),
    };

    let Some(input) = cli.input.clone().or(config.input) else {
        eprintln!("Error: no input document given (pass a path or set `input` in --config)");
        return Err(2);
    };
    let output = cli.output.clone().or(config.output);
    let options = apply_flags(&cli, config.options);

    let format = match &cli.format {
        Some(name) => DocumentFormat::parse(name).ok_or_else(|| {
            eprintln!("Error: unknown format {:?}: expected yaml or json", name);
            2u8
        })?,
        None => {
            let reference = output.as_ref().unwrap_or(&input);
            DocumentFormat::from_extension(&reference.to_string_lossy())
        }
    };

    let result = dereference_file(&input, &options).map_err(report)?;

    let text = render_document(&result.document, format)
        .map_err(|source| report(DerefError::Serialize { source }))?;

    match &output {
        Some(path) => {
            std::fs::write(path, &text).map_err(|source| {
                report(DerefError::WriteError {
                    path: path.clone(),
                    source,
                })
            })?;
            if !cli.quiet {
                eprintln!("Wrote flattened spec to: {}", path.display());
            }
        }
        None => {
            print!("{}", text);
        }
    }

    if !cli.quiet {
        eprint!("{}", result.summary(options.prune_unused_components));
    }

    Ok(())
}

/// Print a fatal error and map it to the process exit code.
fn report(e: DerefError) -> u8 {
    eprintln!("Error: {}", e);
    e.exit_code() as u8
}

/// Command-line flags override config file values.
fn apply_flags(cli: &Cli, mut options: DerefOptions) -> DerefOptions {
    if let Some(version) = &cli.openapi_version {
        options = options.openapi_version(version.clone());
    }
    if cli.allow_http {
        options = options.allow_http_fetch(true);
    }
    if cli.no_external_refs {
        options = options.handle_external_refs(false);
    }
    if cli.no_resolved_from {
        options = options.add_resolved_from(false);
    }
    if cli.no_merge_required {
        options = options.merge_required_lists(false);
    }
    if cli.no_circular_placeholder {
        options = options.circular_placeholder(false);
    }
    if let Some(depth) = cli.max_depth {
        options = options.max_resolution_depth(depth);
    }
    if cli.no_prune {
        options = options.prune_unused_components(false);
    }
    if !cli.sections.is_empty() {
        options = options.component_sections(cli.sections.iter().cloned());
    }
    options
}
