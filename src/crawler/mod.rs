//! Crawler module for breadth-first fetching
//!
//! This module contains the core crawling logic, including:
//! - The frontier and visited set with atomic admission
//! - The fixed-size worker pool
//! - HTTP fetching and HTML extraction
//! - Overall crawl coordination and completion detection

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod pool;
mod worker;

pub use coordinator::{Coordinator, CrawlPhase, CrawlSummary};
pub use fetcher::{build_http_client, fetch_page, FetchedPage, HttpFetcher, PageFetcher};
pub use frontier::{Admission, Frontier};
pub use parser::{parse_html, ParsedPage};
pub use pool::{Completion, ShutdownReport, WorkerPool};

use crate::config::Config;
use crate::storage::ResultStore;
use crate::CrawlError;
use std::future::Future;

/// Runs a complete crawl over HTTP
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Load prior results from the configured results file
/// 2. Build the HTTP fetcher
/// 3. Crawl breadth-first from `seed` until the frontier is exhausted or
///    the page budget is reached
///
/// # Example
///
/// ```no_run
/// use ripple_bfs::config::Config;
/// use ripple_bfs::crawler::crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = crawl(&Config::default(), "https://example.com/").await?;
/// println!("Visited {} pages", summary.visited.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: &Config, seed: &str) -> Result<CrawlSummary, CrawlError> {
    crawl_until(config, seed, std::future::pending()).await
}

/// Like `crawl`, but shuts down gracefully once `shutdown` resolves
pub async fn crawl_until<S>(
    config: &Config,
    seed: &str,
    shutdown: S,
) -> Result<CrawlSummary, CrawlError>
where
    S: Future<Output = ()>,
{
    crawl_until_forced(config, seed, shutdown, std::future::pending()).await
}

/// Like `crawl_until`, but cuts the shutdown grace period short once `force`
/// resolves
pub async fn crawl_until_forced<S, K>(
    config: &Config,
    seed: &str,
    shutdown: S,
    force: K,
) -> Result<CrawlSummary, CrawlError>
where
    S: Future<Output = ()>,
    K: Future<Output = ()>,
{
    let fetcher = HttpFetcher::from_config(config)?;
    let store = ResultStore::load(&config.output.results_path).await;
    let coordinator = Coordinator::new(seed, &config.crawler, fetcher, store)?;
    Ok(coordinator.run_until_forced(shutdown, force).await)
}
