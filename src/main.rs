use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

use price_pipeline::config::PipelineConfig;
use price_pipeline::logging::{init_logging, LogOptions};
use price_pipeline::metrics;
use price_pipeline::{CancellationToken, Orchestrator, UserInput};

#[derive(Parser)]
#[command(name = "price-pipeline")]
#[command(about = "Normalize a product query and rank the offers found for it")]
#[command(version = "0.1.0")]
struct Cli {
    /// Free-text product query, e.g. "iPhone 16 Pro, 128GB"
    #[arg(long)]
    query: Option<String>,

    /// Country code the offers are searched in, e.g. US
    #[arg(long)]
    country: Option<String>,

    /// JSON file holding {"query": ..., "country": ...}
    #[arg(long = "input_file", alias = "input-file", value_name = "PATH")]
    input_file: Option<PathBuf>,

    /// Pipeline configuration (TOML, or JSON by extension)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the stage flow and exit
    #[arg(long)]
    describe: bool,

    /// Write the run report as JSON to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Print a Prometheus snapshot of the run's metrics to stderr
    #[arg(long)]
    metrics: bool,

    /// Also write JSON logs into this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn read_input(cli: &Cli) -> Result<UserInput> {
    if let Some(path) = &cli.input_file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read input file {}", path.display()))?;
        let input: UserInput = serde_json::from_str(&content)
            .with_context(|| format!("cannot parse input file {}", path.display()))?;
        return Ok(input);
    }

    match (&cli.query, &cli.country) {
        (Some(query), Some(country)) => Ok(UserInput::new(query.as_str(), country.as_str())),
        _ => bail!("must provide both --query and --country, or --input_file"),
    }
}

fn write_report(path: &Path, report: &impl serde::Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("cannot serialize run report")?;
    fs::write(path, json).with_context(|| format!("cannot write run report to {}", path.display()))?;
    info!("Run report written to {}", path.display());
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    if cli.describe {
        println!("{}", Orchestrator::describe_flow());
        return Ok(());
    }

    let input = read_input(&cli)?;
    let config_path = cli.config.clone().unwrap_or_else(PipelineConfig::default_path);
    debug!("Using config {}", config_path.display());
    let config = PipelineConfig::load(&config_path)
        .with_context(|| format!("cannot load config {}", config_path.display()))?;
    let orchestrator = Orchestrator::new(&config).context("cannot build pipeline")?;

    if cli.metrics && !metrics::init_metrics() {
        debug!("Metrics recorder unavailable; snapshot will be empty");
    }

    let run = orchestrator
        .run_with(&input, &CancellationToken::new())
        .context("pipeline run failed")?;

    let json = serde_json::to_string_pretty(&run.products).context("cannot serialize results")?;
    println!("{}", json);

    if let Some(path) = &cli.report {
        write_report(path, &run.report)?;
    }
    if cli.metrics {
        if let Some(snapshot) = metrics::render() {
            eprintln!("{}", snapshot);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let _guard = init_logging(&LogOptions::new(cli.verbose, cli.log_dir.clone()));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = format!("{:#}", e).replace('\n', " ");
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}
