//! Shadow Run Report
//!
//! Offline analysis of shadow-run telemetry: run summary, most frequently
//! missed entities, and the cutover verdict.
//!
//! **Usage:**
//! ```bash
//! erm-shadow-report [--telemetry-dir <DIR>] [--config <FILE>] [--top <N>] [--date <YYYY-MM-DD>] [--json]
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use erm_common::config::{load_toml_config, resolve_telemetry_dir, TomlConfig};
use erm_engine::shadow::{load_summary, read_comparisons, CutoverCriteria, CutoverVerdict, RunSummary};
use erm_engine::EntityId;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Shadow-run report
#[derive(Parser, Debug)]
#[clap(name = "erm-shadow-report")]
#[clap(about = "Summarize shadow-run telemetry and assess cutover readiness")]
struct Args {
    /// Telemetry directory (overrides ERM_TELEMETRY_DIR and the config file)
    #[clap(long, value_name = "DIR")]
    telemetry_dir: Option<PathBuf>,

    /// Bootstrap TOML config
    #[clap(long, value_name = "FILE", default_value = "erm.toml")]
    config: PathBuf,

    /// Number of missed entities to list
    #[clap(long, default_value = "10")]
    top: usize,

    /// Also re-read the comparison log of this UTC date
    #[clap(long, value_name = "YYYY-MM-DD")]
    date: Option<NaiveDate>,

    /// Minimum number of comparisons for cutover
    #[clap(long, default_value = "500")]
    min_comparisons: u64,

    /// Minimum average coverage percentage for cutover
    #[clap(long, default_value = "98.0")]
    min_coverage: f64,

    /// Maximum average confidence divergence for cutover
    #[clap(long, default_value = "5.0")]
    max_divergence: f64,

    /// Maximum average latency delta (ms) for cutover
    #[clap(long, default_value = "50.0")]
    max_latency_delta: f64,

    /// Machine-readable JSON output
    #[clap(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct DayLog {
    date: NaiveDate,
    comparisons: usize,
    avg_coverage: Option<f64>,
}

#[derive(Debug, Serialize)]
struct Report {
    telemetry_dir: PathBuf,
    summary: RunSummary,
    top_missed: Vec<MissedEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    day: Option<DayLog>,
    cutover: CutoverVerdict,
}

#[derive(Debug, Serialize)]
struct MissedEntity {
    entity_id: EntityId,
    count: u64,
}

fn init_logging(config: &TomlConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn day_log(dir: &Path, date: NaiveDate) -> Result<DayLog> {
    let records = read_comparisons(dir, date)
        .with_context(|| format!("Failed to read comparison log for {}", date))?;
    let avg_coverage = if records.is_empty() {
        None
    } else {
        Some(records.iter().map(|r| r.metrics.coverage).sum::<f64>() / records.len() as f64)
    };
    Ok(DayLog {
        date,
        comparisons: records.len(),
        avg_coverage,
    })
}

fn print_text(report: &Report) {
    let summary = &report.summary;
    println!("Shadow run report: {}", report.telemetry_dir.display());
    println!();
    println!("Comparisons:            {}", summary.comparison_count);
    println!("Engine errors:          {}", summary.engine_error_count);
    println!("Average coverage:       {:.2}%", summary.avg_coverage);
    if summary.divergence_samples > 0 {
        println!(
            "Average divergence:     {:.2} ({} samples)",
            summary.avg_confidence_divergence, summary.divergence_samples
        );
    } else {
        println!("Average divergence:     n/a");
    }
    println!("Average latency delta:  {:+.1}ms", summary.avg_performance_delta_ms);
    if let Some(updated_at) = summary.updated_at {
        println!("Last updated:           {}", updated_at.to_rfc3339());
    }

    if let Some(day) = &report.day {
        println!();
        match day.avg_coverage {
            Some(coverage) => println!(
                "Log {}: {} comparisons, average coverage {:.2}%",
                day.date, day.comparisons, coverage
            ),
            None => println!("Log {}: no comparisons", day.date),
        }
    }

    println!();
    if report.top_missed.is_empty() {
        println!("No missed entities");
    } else {
        println!("Most frequently missed entities:");
        for missed in &report.top_missed {
            println!("  {:>10}  missed {} times", missed.entity_id, missed.count);
        }
    }

    println!();
    if report.cutover.ready {
        println!("Cutover: READY");
    } else {
        println!("Cutover: NOT READY");
        for reason in &report.cutover.reasons {
            println!("  - {}", reason);
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_toml_config(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    init_logging(&config)?;

    let telemetry_dir = resolve_telemetry_dir(args.telemetry_dir.as_deref(), &config);
    info!(dir = %telemetry_dir.display(), "Reading shadow telemetry");

    let summary = load_summary(&telemetry_dir);
    let criteria = CutoverCriteria {
        min_comparisons: args.min_comparisons,
        min_avg_coverage: args.min_coverage,
        max_avg_divergence: args.max_divergence,
        max_avg_performance_delta_ms: args.max_latency_delta,
    };

    let day = match args.date {
        Some(date) => Some(day_log(&telemetry_dir, date)?),
        None => None,
    };

    let report = Report {
        top_missed: summary
            .top_missed(args.top)
            .into_iter()
            .map(|(entity_id, count)| MissedEntity { entity_id, count })
            .collect(),
        cutover: summary.assess_cutover(&criteria),
        day,
        summary,
        telemetry_dir,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }

    Ok(())
}
