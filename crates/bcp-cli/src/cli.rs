// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::CliError;
use crate::events::{nearest_event, read_events};
use crate::prices::{DateWindow, PriceRecord, ReturnSeries, read_prices};
use crate::report::{
    DetectionReport, InputSummary, ResultRow, write_csv_output, write_json_output,
};
use bcp_core::{Constraints, ExecutionContext, TracingTelemetrySink};
use bcp_posterior::detect_change_point;
use bcp_sampler::{ConvergencePolicy, SamplerConfig};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Bayesian single change-point detection for price histories.
#[derive(Debug, Parser)]
#[command(name = "bcp", version, about)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Locate the most probable change in mean of the log returns.
    Detect(DetectArgs),
}

#[derive(Clone, Debug, Default, Args)]
pub struct DetectArgs {
    /// Price history CSV with `Date,Price` columns.
    #[arg(long)]
    pub prices: PathBuf,

    /// Event CSV with `Date,Description,Type` columns.
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// First date of the analysis window (YYYY-MM-DD).
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last date of the analysis window (YYYY-MM-DD).
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// JSON sampler configuration; flags below override it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub chains: Option<usize>,

    #[arg(long)]
    pub draws: Option<usize>,

    /// Tuning sweeps per chain.
    #[arg(long)]
    pub tune: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Wall-clock budget for the whole run.
    #[arg(long)]
    pub time_budget_ms: Option<u64>,

    /// Fail instead of warning when the chains have not converged.
    #[arg(long)]
    pub strict_convergence: bool,

    /// JSON report path; stdout when omitted.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Single-row CSV summary path.
    #[arg(long)]
    pub csv_output: Option<PathBuf>,
}

/// Dispatches a parsed command line.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::Detect(args) => handle_detect(args),
    }
}

fn handle_detect(args: &DetectArgs) -> Result<(), CliError> {
    let report = detect(args)?;
    if let Some(path) = args.csv_output.as_deref() {
        write_csv_output(&ResultRow::from_report(&report), path)?;
    }
    write_json_output(&report, args.output.as_deref())
}

/// Config file (or defaults) with the command-line overrides applied.
pub fn resolve_config(args: &DetectArgs) -> Result<SamplerConfig, CliError> {
    let mut config = match args.config.as_deref() {
        Some(path) => load_config(path)?,
        None => SamplerConfig::default(),
    };
    if let Some(chains) = args.chains {
        config.chains = chains;
    }
    if let Some(draws) = args.draws {
        config.draws = draws;
    }
    if let Some(tune) = args.tune {
        config.tune_steps = tune;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.strict_convergence {
        config.convergence_policy = ConvergencePolicy::Strict;
    }
    config.validate()?;
    Ok(config)
}

fn load_config(path: &Path) -> Result<SamplerConfig, CliError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| CliError::io(format!("failed to read '{}'", path.display()), source))?;
    serde_json::from_str(&raw)
        .map_err(|source| CliError::json(format!("invalid config '{}'", path.display()), source))
}

fn open(path: &Path) -> Result<File, CliError> {
    File::open(path)
        .map_err(|source| CliError::io(format!("failed to open '{}'", path.display()), source))
}

/// Reads the inputs, runs inference on the windowed log returns and
/// matches the change-point date against the event table.
pub fn detect(args: &DetectArgs) -> Result<DetectionReport, CliError> {
    let config = resolve_config(args)?;
    let window = DateWindow::new(args.start, args.end)?;

    let prices: Vec<PriceRecord> = read_prices(open(&args.prices)?)?
        .into_iter()
        .filter(|record| window.contains(record.date))
        .collect();
    if prices.len() < 3 {
        return Err(CliError::invalid_input(format!(
            "at least 3 prices inside the window are needed to form 2 returns; got {}",
            prices.len()
        )));
    }
    let returns = ReturnSeries::from_prices(&prices);
    let series = returns.to_observations()?;

    let events = match args.events.as_deref() {
        Some(path) => read_events(open(path)?, &window)?,
        None => Vec::new(),
    };

    let constraints = Constraints {
        time_budget_ms: args.time_budget_ms,
        ..Constraints::default()
    };
    let sink = TracingTelemetrySink;
    let ctx = ExecutionContext::new(&constraints)
        .with_progress_sink(&sink)
        .with_telemetry_sink(&sink);

    tracing::info!(
        prices = prices.len(),
        returns = returns.len(),
        events = events.len(),
        chains = config.chains,
        draws = config.draws,
        "starting change-point detection"
    );
    let result = detect_change_point(&series, Some(&returns.levels), &config, &ctx)?;

    let change_point_date = returns
        .dates
        .get(result.change_point_index)
        .copied()
        .ok_or_else(|| {
            CliError::invalid_input(format!(
                "change point index {} has no return date",
                result.change_point_index
            ))
        })?;
    let closest_event = nearest_event(&events, change_point_date).cloned();
    if let Some(event) = &closest_event {
        tracing::info!(
            %change_point_date,
            event_date = %event.date,
            event = %event.description,
            "closest event"
        );
    }

    Ok(DetectionReport {
        command: "detect",
        input: InputSummary {
            prices_path: args.prices.display().to_string(),
            events_path: args.events.as_ref().map(|path| path.display().to_string()),
            window,
            price_rows: prices.len(),
            returns: returns.len(),
            events: events.len(),
        },
        config,
        change_point_date,
        closest_event,
        result,
    })
}
