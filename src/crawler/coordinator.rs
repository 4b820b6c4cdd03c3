//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator owns the frontier and the worker pool and drives the crawl
//! through its phases:
//! - Seeding: offer the seed address
//! - Draining: submit every queued address to the pool
//! - Completing: wait for completions, returning to Draining whenever a
//!   finished unit has queued new addresses
//! - Done: shut the pool down
//!
//! The crawl is done once the frontier is empty and no unit is outstanding.
//! The coordinator never fetches anything itself.

use crate::config::{validate_seed, CrawlerConfig};
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::frontier::Frontier;
use crate::crawler::pool::{ShutdownReport, WorkerPool};
use crate::crawler::worker::{process_address, WorkerContext};
use crate::output::{CrawlStats, StatsSnapshot};
use crate::storage::ResultStore;
use crate::CrawlError;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Phases of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Seeding,
    Draining,
    Completing,
    Done,
}

/// What a finished crawl reports
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub seed: String,
    /// Every admitted address, in admission order
    pub visited: Vec<String>,
    /// Records held by the result store, including ones loaded at startup
    pub records_stored: usize,
    pub stats: StatsSnapshot,
    pub shutdown: ShutdownReport,
    /// True if the crawl was cut short by the shutdown signal
    pub interrupted: bool,
    pub elapsed: Duration,
}

enum WaitEvent {
    Completed,
    Interrupted,
}

/// Main crawler coordinator structure
pub struct Coordinator<F: PageFetcher> {
    seed: String,
    context: WorkerContext<F>,
    pool: WorkerPool,
    grace: Duration,
    phase: CrawlPhase,
}

impl<F: PageFetcher> Coordinator<F> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `seed` - The address the crawl starts from (http or https)
    /// * `config` - Pool size, page budget, and shutdown grace period
    /// * `fetcher` - Fetches and extracts pages
    /// * `store` - Result store, already loaded
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlError)` - The seed is not a valid http(s) address
    pub fn new(
        seed: impl Into<String>,
        config: &CrawlerConfig,
        fetcher: F,
        store: ResultStore,
    ) -> Result<Self, CrawlError> {
        let seed = seed.into();
        validate_seed(&seed).map_err(|e| CrawlError::InvalidSeed {
            url: seed.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            seed,
            context: WorkerContext {
                fetcher: Arc::new(fetcher),
                frontier: Arc::new(Frontier::new(config.page_budget as usize)),
                store: Arc::new(store),
                stats: Arc::new(CrawlStats::new()),
            },
            pool: WorkerPool::new(config.worker_count as usize),
            grace: config.shutdown_grace(),
            phase: CrawlPhase::Seeding,
        })
    }

    pub fn frontier(&self) -> Arc<Frontier> {
        self.context.frontier.clone()
    }

    pub fn store(&self) -> Arc<ResultStore> {
        self.context.store.clone()
    }

    pub fn stats(&self) -> Arc<CrawlStats> {
        self.context.stats.clone()
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Runs the crawl to completion
    pub async fn run(self) -> CrawlSummary {
        self.run_until(std::future::pending()).await
    }

    /// Runs the crawl until it completes or `shutdown` resolves
    ///
    /// An interruption skips straight to shutting the pool down; units already
    /// running get the grace period to finish.
    pub async fn run_until<S>(self, shutdown: S) -> CrawlSummary
    where
        S: Future<Output = ()>,
    {
        self.run_until_forced(shutdown, std::future::pending()).await
    }

    /// Like `run_until`, but abandons running units as soon as `force`
    /// resolves instead of waiting out the grace period
    pub async fn run_until_forced<S, K>(mut self, shutdown: S, force: K) -> CrawlSummary
    where
        S: Future<Output = ()>,
        K: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let mut interrupted = false;
        tokio::pin!(shutdown);

        tracing::info!(
            "Starting crawl from {} (budget {}, {} workers)",
            self.seed,
            self.context.frontier.budget(),
            self.pool.size()
        );

        loop {
            match self.phase {
                CrawlPhase::Seeding => {
                    self.context.frontier.offer(&self.seed);
                    self.phase = CrawlPhase::Draining;
                }

                CrawlPhase::Draining => {
                    let submitted = self.drain();
                    tracing::debug!(
                        "Draining pass submitted {} units ({} outstanding, {} visited)",
                        submitted,
                        self.pool.outstanding(),
                        self.context.frontier.visited_count()
                    );
                    self.phase = self.next_phase();
                }

                CrawlPhase::Completing => {
                    let event = tokio::select! {
                        _ = self.pool.next_completion() => WaitEvent::Completed,
                        _ = &mut shutdown => WaitEvent::Interrupted,
                    };

                    match event {
                        WaitEvent::Completed => self.phase = self.next_phase(),
                        WaitEvent::Interrupted => {
                            tracing::warn!(
                                "Crawl interrupted with {} units outstanding, shutting down",
                                self.pool.outstanding()
                            );
                            interrupted = true;
                            self.phase = CrawlPhase::Done;
                        }
                    }
                }

                CrawlPhase::Done => break,
            }
        }

        let shutdown_report = self.pool.shutdown_or(self.grace, force).await;
        let summary = CrawlSummary {
            seed: self.seed.clone(),
            visited: self.context.frontier.visited(),
            records_stored: self.context.store.len().await,
            stats: self.context.stats.snapshot(),
            shutdown: shutdown_report,
            interrupted,
            elapsed: start_time.elapsed(),
        };

        tracing::info!(
            "Crawl complete: visited {} pages, {} records stored, in {:?}",
            summary.visited.len(),
            summary.records_stored,
            summary.elapsed
        );

        summary
    }

    /// Submits every queued address as a unit of work
    ///
    /// Every queued address was admitted within the budget, so the whole
    /// queue is submitted.
    fn drain(&mut self) -> usize {
        let mut submitted = 0;

        while let Some(address) = self.context.frontier.take() {
            let unit = process_address(self.context.clone(), address);
            if !self.pool.submit(unit) {
                break;
            }
            submitted += 1;
        }

        self.context.stats.record_submitted(submitted as u64);
        submitted
    }

    /// Decides where to go after a draining pass or a completion
    fn next_phase(&self) -> CrawlPhase {
        if !self.context.frontier.is_empty() {
            CrawlPhase::Draining
        } else if self.pool.is_idle() {
            CrawlPhase::Done
        } else {
            CrawlPhase::Completing
        }
    }
}
