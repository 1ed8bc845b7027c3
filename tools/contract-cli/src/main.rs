use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use step_engine::config::{BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, TIMEOUT_ENV};
use step_engine::{contact_steps, load_paths, HarnessConfig, ScenarioRunner};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod output;

use output::Format;

#[derive(Parser)]
#[command(name = "contacts-contract")]
#[command(about = "Contacts contract tests - Run behaviour scenarios against a contacts API")]
#[command(version = contract_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios against a live API
    Run(RunArgs),
    /// List the step vocabulary
    Steps,
}

#[derive(Args)]
struct RunArgs {
    /// Feature files or directories to run
    #[arg(default_value = "features")]
    paths: Vec<PathBuf>,

    /// Base URL of the API under test
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Request timeout in seconds
    #[arg(
        long,
        env = TIMEOUT_ENV,
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_secs: u64,

    #[arg(long, value_enum, default_value_t = Format::Pretty)]
    format: Format,

    /// Write the run report as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Only run scenarios whose name contains this text
    #[arg(long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => handle_run(args).await,
        Commands::Steps => handle_steps(),
    }
}

async fn handle_run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let mut scenarios = load_paths(&args.paths)?;
    if let Some(filter) = &args.name {
        scenarios.retain(|scenario| scenario.name.contains(filter.as_str()));
    }
    if scenarios.is_empty() {
        println!("🔍 No scenarios found");
        return Ok(ExitCode::SUCCESS);
    }

    let config = HarnessConfig::new(args.base_url).with_timeout_secs(args.timeout_secs);
    info!(base_url = %config.base_url, scenarios = scenarios.len(), "Starting run");
    println!("🚀 Running {} scenarios against {}", scenarios.len(), config.base_url);

    let runner = ScenarioRunner::new(contact_steps()?, config)?;
    let report = runner.run_all(&scenarios).await;

    print!("{}", output::render(&report, args.format));

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        println!("📝 Report written to {}", path.display());
    }

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn handle_steps() -> anyhow::Result<ExitCode> {
    let registry = contact_steps()?;
    println!("📋 {} registered steps", registry.len());
    print!("{}", output::render_steps(&registry));
    Ok(ExitCode::SUCCESS)
}
