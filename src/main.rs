//! Ripple-BFS main entry point
//!
//! This is the command-line interface for the Ripple-BFS crawler.

use anyhow::Context;
use clap::Parser;
use ripple_bfs::config::{load_config_with_hash, validate, Config};
use ripple_bfs::crawler::crawl_until_forced;
use ripple_bfs::output::{compute_statistics, print_statistics, print_summary};
use ripple_bfs::storage::ResultStore;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Ripple-BFS: a bounded breadth-first web crawler
///
/// Crawls outward from a seed address with a fixed pool of workers, up to a
/// page budget, saving title, description and headings of every page to a
/// JSON file.
#[derive(Parser, Debug)]
#[command(name = "ripple-bfs")]
#[command(version)]
#[command(about = "A bounded breadth-first web crawler", long_about = None)]
struct Cli {
    /// Address to start crawling from (defaults to the config seed)
    #[arg(value_name = "SEED")]
    seed: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Results file (overrides the config)
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Page budget (overrides the config)
    #[arg(long, value_name = "N")]
    pages: Option<u32>,

    /// Worker pool size (overrides the config)
    #[arg(long, value_name = "N")]
    workers: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of the existing results file and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match load_effective_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {:#}", e);
            return Err(e);
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config).await?;
    } else {
        handle_crawl(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_bfs=info,warn"),
            1 => EnvFilter::new("ripple_bfs=debug,info"),
            2 => EnvFilter::new("ripple_bfs=trace,debug"),
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

/// Loads the config file (if any) and applies command-line overrides
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("reading {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(seed) = &cli.seed {
        config.seed = Some(seed.clone());
    }
    if let Some(output) = &cli.output {
        config.output.results_path = output.clone();
    }
    if let Some(pages) = cli.pages {
        config.crawler.page_budget = pages;
    }
    if let Some(workers) = cli.workers {
        config.crawler.worker_count = workers;
    }

    validate(&config).context("invalid command-line override")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Ripple-BFS Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed: {}", config.seed_or_default());
    println!("  Page budget: {}", config.crawler.page_budget);
    println!("  Workers: {}", config.crawler.worker_count);
    println!("  Shutdown grace: {}s", config.crawler.shutdown_grace_secs);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Results: {}", config.output.results_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the results file
///
/// The results file is only read, never moved or rewritten.
async fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let path = &config.output.results_path;
    println!("Results: {}\n", path);

    let records = ResultStore::read_persisted(path)
        .await
        .with_context(|| format!("reading results from {}", path))?;
    print_statistics(&compute_statistics(&records));
    Ok(())
}

/// Handles the main crawl operation
///
/// The first Ctrl-C stops admitting work and gives running pages the grace
/// period to finish. A second Ctrl-C abandons them immediately.
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    let seed = config.seed_or_default();
    let interrupts = spawn_interrupt_counter();

    let result = crawl_until_forced(
        config,
        seed,
        interrupt_count(interrupts.clone(), 1),
        interrupt_count(interrupts, 2),
    )
    .await;

    match result {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Counts Ctrl-C presses for the lifetime of the process
fn spawn_interrupt_counter() -> watch::Receiver<u32> {
    let (tx, rx) = watch::channel(0);
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                // Keep the sender alive so waiters never see a closed channel
                std::future::pending::<()>().await;
            }
            tx.send_modify(|count| *count += 1);
            if *tx.borrow() == 1 {
                tracing::warn!("Interrupted, press Ctrl-C again to stop immediately");
            }
        }
    });
    rx
}

/// Resolves once at least `n` Ctrl-C presses have been seen
async fn interrupt_count(mut rx: watch::Receiver<u32>, n: u32) {
    if rx.wait_for(|&count| count >= n).await.is_err() {
        std::future::pending::<()>().await;
    }
}
