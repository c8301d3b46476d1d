//! Jikiu-Enrich main entry point
//!
//! Command-line interface: load a parts list, crawl the catalogue, write
//! the enriched report.

use anyhow::Context;
use clap::Parser;
use jikiu_enrich::config::load_config_with_hash;
use jikiu_enrich::crawler::Coordinator;
use jikiu_enrich::report::{export_csv, load_records, print_summary, BatchStatistics};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Jikiu-Enrich: a parts-catalog enrichment crawler
///
/// Reads a spare-parts list, looks every item code up in the Jikiu
/// catalogue under rate and concurrency limits, and writes a report with
/// one row per input row. Ctrl-C cancels cooperatively and keeps the
/// results completed so far.
#[derive(Parser, Debug)]
#[command(name = "jikiu-enrich")]
#[command(version = "1.0.0")]
#[command(about = "A parts-catalog enrichment crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Path to the input parts list CSV
    #[arg(short, long, value_name = "CSV")]
    input: PathBuf,

    /// Report output path (overrides the configured report-path)
    #[arg(short, long, value_name = "CSV")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and input and show what would be crawled, without
    /// fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    let records = load_records(&cli.input)
        .with_context(|| format!("failed to load input {}", cli.input.display()))?;
    tracing::info!("Loaded {} records from {}", records.len(), cli.input.display());

    let report_path = cli
        .output
        .unwrap_or_else(|| PathBuf::from(&config.output.report_path));

    if cli.dry_run {
        handle_dry_run(&config, records.len(), &report_path);
        return Ok(());
    }

    let coordinator = Coordinator::new(config).context("failed to set up crawler")?;

    // Ctrl-C requests cooperative cancellation; in-flight lookups finish
    // and completed results are kept.
    let cancel = coordinator.cancellation_token();
    let progress = coordinator.subscribe_progress();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let snapshot = *progress.borrow();
            tracing::warn!(
                "Cancellation requested at {}/{} records",
                snapshot.current,
                snapshot.total
            );
            cancel.cancel();
        }
    });

    let outcome = coordinator.run(records).await?;

    export_csv(&outcome.results, &report_path)
        .with_context(|| format!("failed to write report {}", report_path.display()))?;
    tracing::info!("Report written to {}", report_path.display());

    let stats = BatchStatistics::from_results(&outcome.results, outcome.state);
    print_summary(&stats);

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("jikiu_enrich=info,warn"),
            1 => EnvFilter::new("jikiu_enrich=debug,info"),
            2 => EnvFilter::new("jikiu_enrich=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(
    config: &jikiu_enrich::config::Config,
    record_count: usize,
    report_path: &std::path::Path,
) {
    println!("=== Jikiu-Enrich Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.concurrency);
    println!("  Rate limit: {} req/s", config.crawler.requests_per_second);
    println!("  Max attempts: {}", config.crawler.max_attempts);
    println!(
        "  Retry base delay: {}ms",
        config.crawler.retry_base_delay_ms
    );
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );

    println!("\nCatalogue:");
    println!("  Base URL: {}", config.catalog.base_url);
    println!("  User agent: {}", config.catalog.user_agent);

    println!("\nOutput:");
    println!("  Report: {}", report_path.display());

    println!("\n✓ Configuration is valid");
    println!("✓ Would look up {} records", record_count);
}
