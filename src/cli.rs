//! CLI interface for punchcard.
//!
//! One non-interactive command: scan a month for unfilled
//! flexible-schedule days, write one request file per day, and
//! optionally fire them off in order.
//!
//! Exit code 0 covers both a completed run and "nothing to fill";
//! per-request failures are summarized, never escalated. Exit code 1
//! is reserved for setup-level failures: unreadable template,
//! unresolvable user id, empty diary set, unwritable output.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use clap::Parser;
use jiff::Zoned;

use crate::api::{ApiClient, HttpTransport};
use crate::config::Config;
use crate::execute;
use crate::filter;
use crate::model::ExecutionResult;
use crate::render::TemplateProcessor;

/// Punchcard — fill unclocked flexible-schedule days.
#[derive(Debug, Parser)]
#[command(name = "punchcard")]
pub struct Cli {
    /// Bearer token for API authentication.
    #[arg(long, short)]
    token: String,

    /// Path to the request template file.
    #[arg(long, default_value = "template.http")]
    template: PathBuf,

    /// Directory the per-run output directory is created under.
    #[arg(long, short, default_value = "requests")]
    output_dir: PathBuf,

    /// Year to check (defaults to the current year).
    #[arg(long, short)]
    year: Option<i16>,

    /// Month to check, 1-12 (defaults to the current month).
    #[arg(long, short)]
    month: Option<i8>,

    /// Enable verbose logging.
    #[arg(long, short)]
    verbose: bool,

    /// Enable debug logging (extra verbose).
    #[arg(long, short)]
    debug: bool,

    /// Execute the generated requests.
    #[arg(long, short)]
    execute: bool,

    /// Skip TLS certificate verification.
    /// Only for installations with broken certificate chains.
    #[arg(long)]
    insecure: bool,
}

/// Run the CLI, returning an error message on fatal failure.
pub fn run(config: &Config) -> Result<(), String> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);
    cmd_fill(&cli, config)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the verbosity flags pick the
/// default level.
fn init_logging(verbose: bool, debug: bool) {
    let default = if debug {
        "punchcard=debug"
    } else if verbose {
        "punchcard=info"
    } else {
        "punchcard=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// The whole pipeline: window → user → fetch → filter → render →
/// (optionally) execute → summary.
fn cmd_fill(cli: &Cli, config: &Config) -> Result<(), String> {
    let (year, month) = resolve_month(cli.year, cli.month);

    let processor = TemplateProcessor::from_file(&cli.template).map_err(|e| e.to_string())?;

    let transport =
        HttpTransport::new(cli.insecure).map_err(|e| format!("failed to build HTTP client: {e}"))?;
    let mut client = ApiClient::new(cli.token.clone(), &config.base_url, transport);

    tracing::info!("resolving user id");
    let user_id = client
        .resolve_user_id()
        .ok_or("failed to resolve user id from token or API")?;
    tracing::info!("resolved user id {user_id}");

    tracing::info!("fetching diaries for {year}-{month:02}");
    let diaries = client.monthly_diaries(user_id, year, month);
    if diaries.is_empty() {
        return Err(format!("no diaries found for {year}-{month:02}"));
    }
    tracing::debug!("found {} diaries", diaries.len());
    if let Some(sample) = diaries.first() {
        tracing::debug!("sample diary: {sample:?}");
    }

    let today = Zoned::now().date();
    let actionable = filter::actionable(&diaries, today);
    if actionable.is_empty() {
        println!("No flexible schedule days found that need to be filled");
        return Ok(());
    }

    let run_dir = create_run_dir(&cli.output_dir)?;

    let mut artifacts = Vec::new();
    for entry in &actionable {
        let path = processor
            .write_artifact(entry, user_id, client.token(), &run_dir)
            .map_err(|e| e.to_string())?;
        artifacts.push(path);
    }

    println!("Summary:");
    println!("- User ID: {user_id}");
    println!("- Month: {year}-{month:02}");
    println!("- Total days: {}", diaries.len());
    println!("- Flexible schedule days: {}", actionable.len());
    println!("- Request files created: {}", artifacts.len());
    println!("- Output directory: {}", run_dir.display());

    if cli.execute {
        let results = execute_all(&artifacts, config.request_delay_ms);
        print_execution_summary(&results);
    }

    Ok(())
}

/// Explicit arguments override the current date.
fn resolve_month(year: Option<i16>, month: Option<i8>) -> (i16, i8) {
    let now = Zoned::now().date();
    (year.unwrap_or(now.year()), month.unwrap_or(now.month()))
}

/// Create the timestamped directory this run writes artifacts into.
fn create_run_dir(base: &Path) -> Result<PathBuf, String> {
    let stamp = Zoned::now().strftime("%Y%m%d_%H%M%S");
    let dir = base.join(format!("fill_requests_{stamp}"));

    fs::create_dir_all(&dir)
        .map_err(|e| format!("failed to create output directory {}: {e}", dir.display()))?;
    tracing::info!("created output directory {}", dir.display());
    Ok(dir)
}

/// Dispatch artifacts strictly in order, pausing between requests so
/// the service's rate limits are respected.
fn execute_all(artifacts: &[PathBuf], delay_ms: u64) -> Vec<ExecutionResult> {
    tracing::info!("executing {} requests", artifacts.len());

    let mut results = Vec::with_capacity(artifacts.len());
    for (i, artifact) in artifacts.iter().enumerate() {
        tracing::info!("executing request from {}", artifact.display());
        let result = execute::execute(artifact);
        if result.success {
            tracing::info!("request succeeded");
        } else {
            tracing::error!("request failed: {}", result.output);
        }
        results.push(result);

        if i + 1 < artifacts.len() {
            thread::sleep(Duration::from_millis(delay_ms));
        }
    }
    results
}

fn print_execution_summary(results: &[ExecutionResult]) {
    let successful = results.iter().filter(|r| r.success).count();

    println!("Execution summary:");
    println!("- Succeeded: {successful}/{}", results.len());
    if successful < results.len() {
        println!("- Failed: {}/{}", results.len() - successful, results.len());
    }
}
