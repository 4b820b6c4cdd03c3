//! Concurrency properties of the coordinator, checked with an in-process
//! fetcher that records how many fetches run per address at once.

use ripple_bfs::config::CrawlerConfig;
use ripple_bfs::crawler::{Coordinator, FetchedPage, PageFetcher};
use ripple_bfs::storage::ResultStore;
use ripple_bfs::FetchError;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Serves a densely linked synthetic site and records fetch concurrency
#[derive(Default)]
struct InstrumentedFetcher {
    pages: usize,
    in_flight: Mutex<HashMap<String, usize>>,
    calls: Mutex<HashMap<String, usize>>,
    max_per_address: AtomicUsize,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

impl InstrumentedFetcher {
    fn new(pages: usize) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    /// Page `i` links to a handful of neighbours plus the first few pages,
    /// so the same addresses are discovered by many workers at once.
    fn links_of(&self, i: usize) -> Vec<String> {
        let mut links: Vec<String> = (1..=4)
            .map(|step| address((i * 3 + step) % self.pages))
            .collect();
        links.extend((0..3).map(address));
        links
    }
}

fn address(i: usize) -> String {
    format!("https://site.test/page/{}", i)
}

fn index_of(url: &str) -> Option<usize> {
    url.rsplit('/').next()?.parse().ok()
}

impl PageFetcher for InstrumentedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            let count = in_flight.entry(url.to_string()).or_insert(0);
            *count += 1;
            self.max_per_address.fetch_max(*count, Ordering::SeqCst);
            *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;
        }
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);

        let i = index_of(url).unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(1 + (i % 5) as u64)).await;

        self.running.fetch_sub(1, Ordering::SeqCst);
        *self.in_flight.lock().unwrap().get_mut(url).unwrap() -= 1;

        if i % 11 == 7 {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 503,
            });
        }

        Ok(FetchedPage {
            title: format!("Page {}", i),
            links: self.links_of(i),
            ..FetchedPage::default()
        })
    }
}

/// Forwards to a shared fetcher so the test keeps a handle on it
struct Shared(Arc<InstrumentedFetcher>);

impl PageFetcher for Shared {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.0.fetch(url).await
    }
}

fn crawler_config(page_budget: u32, worker_count: u32) -> CrawlerConfig {
    CrawlerConfig {
        worker_count,
        page_budget,
        shutdown_grace_secs: 5,
        request_timeout_secs: 5,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_address_fetched_twice_and_budget_respected() {
    let fetcher = Arc::new(InstrumentedFetcher::new(200));
    let dir = TempDir::new().unwrap();
    let results_path = dir.path().join("results.json");

    let coordinator = Coordinator::new(
        address(0),
        &crawler_config(60, 8),
        Shared(fetcher.clone()),
        ResultStore::load(&results_path).await,
    )
    .unwrap();

    // Sample the visited set size while the crawl runs
    let frontier = coordinator.frontier();
    let finished = Arc::new(AtomicBool::new(false));
    let sampler = {
        let frontier = frontier.clone();
        let finished = finished.clone();
        tokio::spawn(async move {
            let mut max_seen = 0;
            while !finished.load(Ordering::SeqCst) {
                max_seen = max_seen.max(frontier.visited_count());
                tokio::task::yield_now().await;
            }
            max_seen
        })
    };

    let summary = coordinator.run().await;
    finished.store(true, Ordering::SeqCst);
    let max_seen = sampler.await.unwrap();

    assert!(max_seen <= 60);
    assert_eq!(summary.visited.len(), 60);
    assert_eq!(fetcher.max_per_address.load(Ordering::SeqCst), 1);
    assert!(fetcher.max_running.load(Ordering::SeqCst) <= 8);

    let calls = fetcher.calls.lock().unwrap();
    assert_eq!(calls.len(), 60);
    assert!(calls.values().all(|&n| n == 1));

    // Every record is unique and was visited
    let records = ResultStore::load(&results_path).await.records().await;
    let urls: HashSet<&str> = records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls.len(), records.len());
    assert!(records.iter().all(|r| summary.visited.contains(&r.url)));
    assert_eq!(
        records.len() as u64 + summary.stats.fetch_failures,
        summary.stats.submitted
    );
    assert_eq!(summary.stats.submitted, 60);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_small_site_is_exhausted_before_budget() {
    let fetcher = Arc::new(InstrumentedFetcher::new(12));
    let dir = TempDir::new().unwrap();

    let coordinator = Coordinator::new(
        address(0),
        &crawler_config(100, 5),
        Shared(fetcher.clone()),
        ResultStore::empty(dir.path().join("results.json")),
    )
    .unwrap();

    let summary = coordinator.run().await;

    // Every page of the site is reachable from page 0
    assert_eq!(summary.visited.len(), 12);
    assert_eq!(fetcher.calls.lock().unwrap().len(), 12);
    assert_eq!(fetcher.max_per_address.load(Ordering::SeqCst), 1);
    assert_eq!(summary.shutdown.abandoned, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_single_worker_visits_in_breadth_first_order() {
    let fetcher = Arc::new(InstrumentedFetcher::new(40));
    let dir = TempDir::new().unwrap();

    let coordinator = Coordinator::new(
        address(0),
        &crawler_config(10, 1),
        Shared(fetcher.clone()),
        ResultStore::empty(dir.path().join("results.json")),
    )
    .unwrap();

    let summary = coordinator.run().await;

    // Page 0 links to 1..=4 and then 0..3, so those are admitted first
    assert_eq!(
        &summary.visited[..5],
        &[address(0), address(1), address(2), address(3), address(4)]
    );
    assert_eq!(fetcher.max_running.load(Ordering::SeqCst), 1);
    assert_eq!(summary.visited.len(), 10);
}
