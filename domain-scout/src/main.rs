//! Domain Scout CLI Application
//!
//! Reads a JSON check request from a file or stdin, runs it through
//! domain-scout-lib, and writes the JSON response to a file or stdout.

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use console::style;
use domain_scout_lib::{resolve_defaults, CheckOptions, CheckRequest, ConfigManager};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "DOMAIN_SCOUT_LOG";

/// Exit code for unreadable or invalid input and configuration.
const EXIT_INPUT: i32 = 2;

/// Exit code for failures while running the check.
const EXIT_RUNTIME: i32 = 3;

/// CLI arguments for domain-scout
#[derive(Parser, Debug)]
#[command(name = "domain-scout")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check candidate domain names via RDAP with DNS fallback")]
#[command(
    long_about = "Check candidate domain names via RDAP with DNS fallback.\n\nReads a JSON request {\"tlds\": [...], \"slds\": [...], \"options\": {...}} and writes a JSON response with per-domain results and a suggested best domain."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Path to the JSON request (reads stdin when omitted)
    #[arg(long, value_name = "PATH", help_heading = "Input/Output")]
    pub input: Option<PathBuf>,

    /// Path to write the JSON response (writes stdout when omitted)
    #[arg(long, value_name = "PATH", help_heading = "Input/Output")]
    pub output: Option<PathBuf>,

    /// Use a specific TOML config file instead of discovery
    #[arg(long, value_name = "PATH", help_heading = "Configuration")]
    pub config: Option<PathBuf>,

    /// Simulate every check offline (default for requests that do not set it)
    #[arg(long, help_heading = "Configuration")]
    pub deterministic: bool,

    /// Seed for the offline simulation (default for requests that do not set it)
    #[arg(long, value_name = "N", help_heading = "Configuration")]
    pub seed: Option<u64>,

    /// Log progress to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Why the CLI stopped early.
#[derive(Debug)]
enum CliError {
    /// Input or configuration could not be read or is invalid
    Input(String),
    /// The check itself failed, or the response could not be written
    Runtime(String),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Input(_) => EXIT_INPUT,
            CliError::Runtime(_) => EXIT_RUNTIME,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(&args).await {
        match &e {
            CliError::Input(message) => {
                eprintln!("{} {}", style("Input validation error:").red().bold(), message);
            }
            CliError::Runtime(message) => {
                tracing::error!(error = %message, "Domain check failed");
                let payload = serde_json::json!({ "error": message });
                if let Err(write_err) = write_json(&payload, args.output.as_deref()) {
                    eprintln!("{} {}", style("Error:").red().bold(), write_err);
                }
            }
        }
        process::exit(e.exit_code());
    }
}

/// Send logs to stderr so stdout carries only the JSON response.
fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: &Args) -> Result<(), CliError> {
    let request = load_request(args)?;

    // TLD syntax is only checked once the run starts, so an invalid TLD
    // surfaces here as a runtime failure with an error payload.
    let response = domain_scout_lib::check(&request)
        .await
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    write_json(&response, args.output.as_deref()).map_err(CliError::Runtime)
}

/// Read, layer and validate the request.
fn load_request(args: &Args) -> Result<CheckRequest, CliError> {
    let raw = read_input(args.input.as_deref()).map_err(CliError::Input)?;

    let manager = ConfigManager::new(args.verbose);
    let mut defaults = resolve_defaults(&manager, args.config.as_deref())
        .map_err(|e| CliError::Input(e.to_string()))?;
    apply_cli_overrides(args, &mut defaults);

    CheckRequest::from_json_with_defaults(&raw, &defaults).map_err(|e| CliError::Input(e.to_string()))
}

/// CLI flags sit above file and environment config, below the request's own options.
fn apply_cli_overrides(args: &Args, options: &mut CheckOptions) {
    if args.deterministic {
        options.deterministic_mode = true;
    }
    if let Some(seed) = args.seed {
        options.deterministic_seed = seed;
    }
}

fn read_input(path: Option<&Path>) -> Result<String, String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e)),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("cannot read stdin: {}", e))?;
            Ok(buffer)
        }
    }
}

/// Write pretty JSON followed by a newline.
fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<(), String> {
    let mut rendered = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    rendered.push('\n');

    match path {
        Some(path) => std::fs::write(path, rendered)
            .map_err(|e| format!("cannot write {}: {}", path.display(), e)),
        None => {
            print!("{}", rendered);
            Ok(())
        }
    }
}
