//! netfacts CLI - turn network device output into JSON facts
//!
//! Runs parser documents (a single `--file` or every parser in a `--dir`)
//! against device output read from `--content` or stdin and prints the
//! exported facts.

mod config;
mod logging;
mod output;
mod vars;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use config::{Config, EngineOverrides};
use netfacts_rules::{load_document_from_file, load_documents_from_dir, Document, Engine};
use output::{OutputFormat, Reporter};

#[derive(Parser)]
#[command(name = "netfacts")]
#[command(version)]
#[command(about = "Parse network device output into structured facts")]
struct Cli {
    /// Parser document to run
    #[arg(long, short = 'f', value_name = "FILE", conflicts_with = "dir", required_unless_present = "dir")]
    file: Option<PathBuf>,

    /// Directory of parser documents (.yaml, .yml, .json) to run in name order
    #[arg(long, short = 'd', value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Device output to parse; `-` or omitted reads stdin
    #[arg(long, short = 'c', value_name = "FILE")]
    content: Option<PathBuf>,

    /// Seed variable (can be specified multiple times)
    #[arg(long = "var", value_name = "KEY=VALUE")]
    vars: Vec<String>,

    /// YAML or JSON file of seed variables
    #[arg(long = "vars", value_name = "FILE")]
    vars_file: Option<PathBuf>,

    /// Fail on unresolved variable paths instead of using null
    #[arg(long)]
    strict: bool,

    /// Turn directive failures into warnings and keep going
    #[arg(long)]
    continue_on_error: bool,

    /// Output format: json, yaml, text
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,

    /// Path to config file (default: auto-detect .netfacts.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long)]
    no_config: bool,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write logs to a file (default: a timestamped file in the temp dir)
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    log_file: Option<Option<PathBuf>>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Some(path) = logging::init_logging(cli.verbose, cli.log_file.clone())? {
        eprintln!("{}: {}", "Logging to".bold(), path.display());
    }

    // Load config file
    let config = if cli.no_config {
        Config::default()
    } else if let Some(config_path) = &cli.config {
        let cfg = Config::load_path(config_path)?;
        tracing::info!("using config {}", config_path.display());
        cfg
    } else {
        match Config::load()? {
            Some((cfg, path)) => {
                tracing::info!("using config {}", path.display());
                cfg
            }
            None => Config::default(),
        }
    };

    // Command line wins over the config file
    let format_name = cli
        .format
        .as_deref()
        .or(config.output.format.as_deref())
        .unwrap_or("json");
    let output_format = OutputFormat::from_str(format_name).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid output format '{}'. Valid options: json, yaml, text",
            format_name
        )
    })?;

    let engine = Engine::new(config.engine_config(EngineOverrides {
        strict: cli.strict,
        continue_on_error: cli.continue_on_error,
    }));

    let documents = load_documents(&cli)?;
    let content = read_content(cli.content.as_deref())?;
    let seed_vars = vars::seed_vars(cli.vars_file.as_deref(), &cli.vars)?;

    tracing::info!(
        "running {} document(s) over {} bytes of input",
        documents.len(),
        content.len()
    );
    let output = engine
        .execute_all(&documents, &content, &seed_vars)
        .context("Parsing failed")?;

    Reporter::new(output_format, cli.verbose > 0).report(&output)?;

    Ok(ExitCode::SUCCESS)
}

fn load_documents(cli: &Cli) -> Result<Vec<Document>> {
    match (&cli.file, &cli.dir) {
        (Some(file), _) => {
            let document = load_document_from_file(file)
                .with_context(|| format!("Failed to load parser {}", file.display()))?;
            Ok(vec![document])
        }
        (None, Some(dir)) => load_documents_from_dir(dir)
            .with_context(|| format!("Failed to load parsers from {}", dir.display())),
        (None, None) => anyhow::bail!("One of --file or --dir is required"),
    }
}

fn read_content(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read device output from stdin")?;
            Ok(content)
        }
    }
}
