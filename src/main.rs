//! CLI entry point for the guide scraper.

use std::fs::File;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use guide_scraper::ScrapeOrchestrator;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod cli;

use cli::Args;

/// Filter for the diagnostic log file.
const DIAGNOSTIC_FILTER: &str = "guide_scraper=debug,info";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let log_file = File::create(&args.log_file)
        .with_context(|| format!("cannot create log file {}", args.log_file.display()))?;

    // The file writer is owned by the subscriber and closed when the process exits
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(console_filter))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .with_filter(EnvFilter::new(DIAGNOSTIC_FILTER)),
        )
        .init();

    debug!(?args, "CLI arguments parsed");
    info!("Guide scraper starting");

    let config = args.to_config()?;
    config.validate()?;
    config.prepare_output_dir()?;
    let targets = config.targets()?;

    info!(
        pages = targets.len(),
        output_dir = %config.output_dir.display(),
        "Scraping pages"
    );

    let orchestrator = ScrapeOrchestrator::from_config(&config)?;
    let report = orchestrator.run(targets).await;

    info!(
        pages_done = report.pages_done(),
        pages_failed = report.pages_failed(),
        images_saved = report.images_saved(),
        images_failed = report.images_failed(),
        "Scrape complete"
    );

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
