//! Agora-Harvest main entry point
//!
//! Command-line interface for the municipal event harvesting pipeline.

use clap::Parser;
use std::path::{Path, PathBuf};

use agora_harvest::analyze::analyze_site;
use agora_harvest::collect::{run_source_by_name, run_sweep, SourceRunSummary};
use agora_harvest::config::{load_config_with_hash, AppConfig};
use agora_harvest::connector::build_http_client;
use agora_harvest::storage::{sync_catalog, RunStatus, SqliteStorage, Storage};
use tracing_subscriber::EnvFilter;

/// Agora-Harvest: a municipal event harvesting pipeline
///
/// Collects candidate events from configured API and web-page sources,
/// deduplicates them into the event store, and records a per-source audit
/// log for every run.
#[derive(Parser, Debug)]
#[command(name = "agora-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Municipal event harvesting pipeline", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run a test collection for a single source by name
    #[arg(long, value_name = "NAME", conflicts_with_all = ["analyze", "list_sources", "history", "dry_run"])]
    source: Option<String>,

    /// Analyze a URL and suggest a source configuration
    #[arg(long, value_name = "URL", conflicts_with_all = ["list_sources", "history", "dry_run"])]
    analyze: Option<String>,

    /// List configured sources and their last-collected state
    #[arg(long, conflicts_with_all = ["history", "dry_run"])]
    list_sources: bool,

    /// Show recent collection run logs
    #[arg(long, conflicts_with = "dry_run")]
    history: bool,

    /// Validate config and show what would be swept without collecting
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if let Some(url) = &cli.analyze {
        handle_analyze(&config, url).await?;
    } else if cli.list_sources {
        handle_list_sources(&config)?;
    } else if cli.history {
        handle_history(&config)?;
    } else if let Some(name) = &cli.source {
        handle_single_source(&config, name).await?;
    } else {
        handle_sweep(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("agora_harvest=info,warn"),
            1 => EnvFilter::new("agora_harvest=debug,info"),
            2 => EnvFilter::new("agora_harvest=trace,debug"),
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

fn open_storage(config: &AppConfig) -> Result<SqliteStorage, Box<dyn std::error::Error>> {
    let mut storage = SqliteStorage::new(Path::new(&config.store.database_path))?;
    sync_catalog(&mut storage, config)?;
    Ok(storage)
}

/// Handles the --dry-run mode: validates config and shows the sweep plan
fn handle_dry_run(config: &AppConfig) {
    println!("=== Agora-Harvest Dry Run ===\n");

    println!("Store:");
    println!("  Database: {}", config.store.database_path);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.collector_name);
    println!("  Version: {}", config.user_agent.collector_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nRegions ({}):", config.regions.len());
    for region in &config.regions {
        let state = if region.enabled { "enabled" } else { "disabled" };
        println!("  - {} [{}] ({})", region.name, region.code, state);
    }

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        let state = if source.enabled { "enabled" } else { "disabled" };
        println!(
            "  - {} ({:?}, region {}, {})",
            source.name, source.kind, source.region, state
        );
        println!("    {}", source.url);
    }

    let sweepable = config.sources.iter().filter(|s| s.enabled).count();
    println!("\n✓ Configuration is valid");
    println!("✓ Would collect from {} enabled sources", sweepable);
}

/// Handles the default mode: full sweep over all collectable sources
async fn handle_sweep(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut storage = open_storage(config)?;
    let client = build_http_client(&config.user_agent)?;

    let summaries = run_sweep(&mut storage, &client).await?;
    print_summaries(&summaries);

    Ok(())
}

/// Handles --source: a test collection against one source
async fn handle_single_source(
    config: &AppConfig,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut storage = open_storage(config)?;
    let client = build_http_client(&config.user_agent)?;

    let summary = run_source_by_name(&mut storage, &client, name).await?;
    print_summaries(std::slice::from_ref(&summary));

    Ok(())
}

/// Handles --analyze: fetch a page and suggest a configuration
async fn handle_analyze(config: &AppConfig, url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_http_client(&config.user_agent)?;
    let analysis = analyze_site(&client, url).await?;

    println!("=== Site Analysis ===\n");
    println!("URL: {}", analysis.url);
    if let Some(title) = &analysis.title {
        println!("Title: {}", title);
    }
    println!("HTML length: {} bytes", analysis.html_length);

    match &analysis.suggested {
        Some(suggested) => {
            println!("\nBest list selector: {} matches", analysis.match_count);
            println!("\nSuggested configuration:");
            println!("  listSelector  = \"{}\"", suggested.list_selector);
            println!("  titleSelector = \"{}\"", suggested.title_selector);
            println!("  dateSelector  = \"{}\"", suggested.date_selector);
        }
        None => println!("\nNo candidate selector matched enough items to suggest a configuration"),
    }

    if !analysis.samples.is_empty() {
        println!("\nSample items:");
        for (index, sample) in analysis.samples.iter().enumerate() {
            println!("  {}. {}", index + 1, sample);
        }
    }

    Ok(())
}

/// Handles --list-sources
fn handle_list_sources(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(config)?;

    println!("=== Sources ===\n");
    for source in storage.list_sources()? {
        let state = if source.enabled { "enabled" } else { "disabled" };
        let last = source
            .last_collected_at
            .map(|at| at.to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "  [{}] {} ({}, {})",
            source.id,
            source.name,
            source.kind.to_db_string(),
            state
        );
        println!("      {}", source.url);
        println!("      last collected: {}", last);
    }

    Ok(())
}

/// Handles --history: recent collection run logs
fn handle_history(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(config)?;

    println!("=== Recent Collection Runs ===\n");
    for log in storage.recent_run_logs(20)? {
        match log.status {
            RunStatus::Success => println!(
                "  ✓ {} [{}] {} collected, {} added, {} updated",
                log.started_at, log.source_name, log.collected, log.added, log.updated
            ),
            RunStatus::Failed => println!(
                "  ✗ {} [{}] FAILED: {}",
                log.started_at,
                log.source_name,
                log.error_message.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    Ok(())
}

fn print_summaries(summaries: &[SourceRunSummary]) {
    println!("\n=== Collection Summary ===\n");
    for summary in summaries {
        match summary.status {
            RunStatus::Success => println!(
                "  ✓ {}: {} collected, {} added, {} updated",
                summary.source_name, summary.collected, summary.added, summary.updated
            ),
            RunStatus::Failed => println!(
                "  ✗ {}: FAILED - {}",
                summary.source_name,
                summary.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    let failed = summaries
        .iter()
        .filter(|s| s.status == RunStatus::Failed)
        .count();
    println!(
        "\n{} sources processed, {} failed",
        summaries.len(),
        failed
    );
}
