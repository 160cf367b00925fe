//! FreshFlow transfer planner CLI
//!
//! Reads a `{nodes, batches, filters}` payload, runs one planning pass and
//! writes the report as JSON.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────────┐    ┌──────────────┐
//! │ stdin / file │───▶│ PlanningService  │───▶│ stdout / file│
//! │  (payload)   │    │ (rebalance+route)│    │   (report)   │
//! └──────────────┘    └──────────────────┘    └──────────────┘
//!                              │
//!                              ▼
//!              events (stderr log, JSON lines), metrics textfile
//! ```

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use freshflow::adapters::{
    CompositeEventPublisher, JsonLinesEventPublisher, LoggingEventPublisher, PayloadSource,
};
use freshflow::{PlanMode, PlanReport, PlannerConfig, PlannerMetrics, PlanningService};

// =============================================================================
// CLI Arguments
// =============================================================================

/// FreshFlow - transfer recommendations for perishable stock
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(long, env = "FRESHFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Passes to run (all, warehouse_to_warehouse, farm_to_warehouse)
    #[arg(long, env = "FRESHFLOW_MODE", value_parser = parse_mode)]
    mode: Option<PlanMode>,

    /// Maximum recommendations per category
    #[arg(long, env = "FRESHFLOW_MAX_PAIRS")]
    max_pairs: Option<usize>,

    /// Smallest transfer worth recommending, in kilograms
    #[arg(long, env = "FRESHFLOW_MIN_TRANSFER_KG")]
    min_transfer_kg: Option<f64>,

    /// Utilization above which a warehouse is overstocked
    #[arg(long, env = "FRESHFLOW_OVERSTOCK_RATIO")]
    overstock_ratio: Option<f64>,

    /// Utilization below which a warehouse is understocked
    #[arg(long, env = "FRESHFLOW_UNDERSTOCK_RATIO")]
    understock_ratio: Option<f64>,

    /// Utilization both passes aim for
    #[arg(long, env = "FRESHFLOW_TARGET_RATIO")]
    target_ratio: Option<f64>,

    /// Payload file (defaults to stdin)
    #[arg(long, env = "FRESHFLOW_INPUT")]
    input: Option<PathBuf>,

    /// Report file (defaults to stdout)
    #[arg(long, env = "FRESHFLOW_OUTPUT")]
    output: Option<PathBuf>,

    /// Pretty-print the report
    #[arg(long, env = "FRESHFLOW_PRETTY")]
    pretty: bool,

    /// Write planning events to this file as JSON lines
    #[arg(long, env = "FRESHFLOW_EVENTS_FILE")]
    events_file: Option<PathBuf>,

    /// Log every recommended transfer at info level
    #[arg(long, env = "FRESHFLOW_LOG_TRANSFERS")]
    log_transfers: bool,

    /// Write Prometheus metrics to this file after the run
    #[arg(long, env = "FRESHFLOW_METRICS_TEXTFILE")]
    metrics_textfile: Option<PathBuf>,

    /// Print the report JSON Schema and exit
    #[arg(long)]
    print_schema: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

fn parse_mode(value: &str) -> std::result::Result<PlanMode, String> {
    value.parse().map_err(|e: freshflow::Error| e.to_string())
}

impl Args {
    /// Config file (or defaults) with command-line overrides applied, validated.
    fn planner_config(&self) -> Result<PlannerConfig> {
        let mut config = match &self.config {
            Some(path) => PlannerConfig::from_yaml_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => PlannerConfig::default(),
        };

        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        let params = &mut config.parameters;
        if let Some(max_pairs) = self.max_pairs {
            params.max_pairs = max_pairs;
        }
        if let Some(min_transfer_kg) = self.min_transfer_kg {
            params.min_transfer_kg = min_transfer_kg;
        }
        if let Some(overstock_ratio) = self.overstock_ratio {
            params.overstock_ratio = overstock_ratio;
        }
        if let Some(understock_ratio) = self.understock_ratio {
            params.understock_ratio = understock_ratio;
        }
        if let Some(target_ratio) = self.target_ratio {
            params.target_ratio = target_ratio;
        }

        config.validate().context("invalid planner configuration")?;
        Ok(config)
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    if args.print_schema {
        let schema = serde_json::to_string_pretty(&PlanReport::json_schema())?;
        println!("{}", schema);
        return Ok(());
    }

    // Rejects bad parameters before blocking on stdin
    let config = args.planner_config()?;
    info!("Starting FreshFlow planner");
    info!("  Mode: {}", config.mode);
    info!("  Max pairs: {}", config.parameters.max_pairs);
    info!("  Min transfer: {} kg", config.parameters.min_transfer_kg);

    let source = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening input {}", path.display()))?;
            PayloadSource::from_reader(BufReader::new(file))?
        }
        None => PayloadSource::from_reader(io::stdin().lock()).context("reading stdin")?,
    };
    let filter = source.filter().clone();

    let metrics = Arc::new(PlannerMetrics::new()?);
    let service = PlanningService::new(config, source, event_sinks(&args)?)
        .with_metrics(metrics.clone());

    let outcome = service.run(&filter).await;

    if let Some(path) = &args.metrics_textfile {
        metrics
            .write_textfile(path)
            .with_context(|| format!("writing metrics to {}", path.display()))?;
    }

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            error!("Planning failed: {}", e);
            return Err(e).context("planning run failed");
        }
    };

    write_report(&report, &args)?;
    info!(
        run_id = %report.run_id,
        warehouse_to_warehouse = report.counts.warehouse_to_warehouse,
        farm_to_warehouse = report.counts.farm_to_warehouse,
        "Report written"
    );

    Ok(())
}

fn event_sinks(args: &Args) -> Result<CompositeEventPublisher> {
    let logging = if args.log_transfers {
        LoggingEventPublisher::new().with_transfers()
    } else {
        LoggingEventPublisher::new()
    };
    let mut sinks = CompositeEventPublisher::new().with_publisher(logging);
    if let Some(path) = &args.events_file {
        let file = JsonLinesEventPublisher::create(path)
            .with_context(|| format!("creating events file {}", path.display()))?;
        sinks = sinks.with_publisher(file);
    }
    Ok(sinks)
}

fn write_report(report: &PlanReport, args: &Args) -> Result<()> {
    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating output {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    if args.pretty {
        serde_json::to_writer_pretty(&mut writer, report)?;
    } else {
        serde_json::to_writer(&mut writer, report)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Logging
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // stdout carries the report
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .init();
    }
}
