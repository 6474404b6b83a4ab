//! Commit Delta
//!
//! Compares commit activity before and after a tool adoption date and prints
//! the figures as JSON.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use log::debug;
use serde::Serialize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use commit_delta::analysis::{AnalysisOutcome, AnalysisRequest, Analyzer, GitCliSource};
use commit_delta::{AnalysisConfig, LogFormat, WindowTz};

/// Measure commit activity before and after adopting a tool
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Date you started using the tool (YYYY-MM-DD)
    #[arg(long)]
    start_date: NaiveDate,

    /// Days to analyze on each side of the start date
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(i64).range(1..))]
    days: i64,

    /// Override the length of the before window
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
    days_before: Option<i64>,

    /// Override the length of the after window
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
    days_after: Option<i64>,

    /// Timezone for window boundaries: UTC, local or +HH:MM
    #[arg(long)]
    tz: Option<WindowTz>,

    /// Path inside the repository to analyze
    #[arg(short, long, default_value = ".")]
    repo: PathBuf,

    /// Number of most changed files to list
    #[arg(long)]
    top_files: Option<usize>,

    /// Number of busiest days to list
    #[arg(long)]
    top_days: Option<usize>,

    /// Collect per-file line statistics
    #[arg(short, long)]
    verbose: bool,

    /// Name of the tool, echoed in the output
    #[arg(long, default_value = "AI Coding Tool")]
    tool: String,

    /// Config file to use instead of the discovered one
    #[arg(short, long, env = "COMMIT_DELTA_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Serialize)]
struct Output<'a> {
    tool: &'a str,
    #[serde(flatten)]
    outcome: &'a AnalysisOutcome,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = AnalysisConfig::load(args.config.as_deref(), &args.repo)?;
    debug!("effective config: {config:?}");

    let request = AnalysisRequest {
        adoption_date: args.start_date,
        days_before: args.days_before.unwrap_or(args.days),
        days_after: args.days_after.unwrap_or(args.days),
        timezone: args.tz.unwrap_or(config.timezone),
        top_files: args.top_files.unwrap_or(config.top_files),
        top_days: args.top_days.unwrap_or(config.top_days),
        format: if args.verbose {
            LogFormat::NumStat
        } else {
            LogFormat::Summary
        },
    };

    let source = GitCliSource::open(&args.repo)
        .context("make sure you're running this from inside a git repository")?;
    let analyzer = Analyzer::new(source, config.classifier());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let outcome = analyzer
        .run(&request, &cancel)
        .await
        .context("analysis failed")?;

    let output = Output {
        tool: &args.tool,
        outcome: &outcome,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
