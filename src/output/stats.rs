//! Crawl statistics
//!
//! Live counters shared by the workers of a running crawl, and statistics
//! computed from a persisted result set.

use crate::storage::PageRecord;
use chrono::{DateTime, FixedOffset};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

/// Counters updated by workers while a crawl runs
#[derive(Debug, Default)]
pub struct CrawlStats {
    submitted: AtomicU64,
    fetched: AtomicU64,
    fetch_failures: AtomicU64,
    save_failures: AtomicU64,
    links_offered: AtomicU64,
    links_admitted: AtomicU64,
}

/// Point-in-time copy of `CrawlStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Units of work handed to the pool
    pub submitted: u64,
    /// Fetches that produced a page record
    pub fetched: u64,
    pub fetch_failures: u64,
    pub save_failures: u64,
    /// Outbound links offered to the frontier
    pub links_offered: u64,
    /// Offered links that were newly admitted
    pub links_admitted: u64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submitted(&self, count: u64) {
        self.submitted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_fetched(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save_failure(&self) {
        self.save_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_links(&self, offered: u64, admitted: u64) {
        self.links_offered.fetch_add(offered, Ordering::Relaxed);
        self.links_admitted.fetch_add(admitted, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            fetched: self.fetched.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            save_failures: self.save_failures.load(Ordering::Relaxed),
            links_offered: self.links_offered.load(Ordering::Relaxed),
            links_admitted: self.links_admitted.load(Ordering::Relaxed),
        }
    }
}

/// Statistics summary of a persisted result set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultStatistics {
    /// Total number of records
    pub total_records: usize,

    /// Number of distinct hosts across all record URLs
    pub unique_hosts: usize,

    /// Records whose page had no title
    pub untitled: usize,

    /// Records whose page had no meta description
    pub undescribed: usize,

    /// Earliest and latest parseable fetch timestamps
    pub first_fetch: Option<DateTime<FixedOffset>>,
    pub last_fetch: Option<DateTime<FixedOffset>>,
}

/// Computes statistics over a result set
pub fn compute_statistics(records: &[PageRecord]) -> ResultStatistics {
    let hosts: HashSet<String> = records
        .iter()
        .filter_map(|r| Url::parse(&r.url).ok())
        .filter_map(|u| u.host_str().map(str::to_string))
        .collect();

    let timestamps: Vec<_> = records.iter().filter_map(PageRecord::fetched_at).collect();

    ResultStatistics {
        total_records: records.len(),
        unique_hosts: hosts.len(),
        untitled: records.iter().filter(|r| r.title.is_empty()).count(),
        undescribed: records.iter().filter(|r| r.description.is_empty()).count(),
        first_fetch: timestamps.iter().min().copied(),
        last_fetch: timestamps.iter().max().copied(),
    }
}

/// Prints result statistics to stdout
pub fn print_statistics(stats: &ResultStatistics) {
    println!("=== Result Statistics ===\n");
    println!("Total records: {}", stats.total_records);
    println!("Unique hosts: {}", stats.unique_hosts);
    println!("Without title: {}", stats.untitled);
    println!("Without description: {}", stats.undescribed);

    if let (Some(first), Some(last)) = (stats.first_fetch, stats.last_fetch) {
        println!("\nFetched between:");
        println!("  {}", first.to_rfc2822());
        println!("  {}", last.to_rfc2822());
    }
}
