//! Output module for reporting crawl results
//!
//! This module handles:
//! - Live counters updated while a crawl runs
//! - Statistics over a persisted result set
//! - Printing end-of-crawl summaries

pub mod stats;

pub use stats::{
    compute_statistics, print_statistics, CrawlStats, ResultStatistics, StatsSnapshot,
};

use crate::crawler::CrawlSummary;

/// Prints the summary of a finished crawl to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");
    println!("Seed: {}", summary.seed);
    println!("Visited: {} pages", summary.visited.len());
    println!("Fetched: {}", summary.stats.fetched);
    println!("Fetch failures: {}", summary.stats.fetch_failures);
    println!("Save failures: {}", summary.stats.save_failures);
    println!(
        "Links: {} offered, {} admitted",
        summary.stats.links_offered, summary.stats.links_admitted
    );
    println!("Records stored: {}", summary.records_stored);

    if summary.shutdown.abandoned > 0 {
        println!("Abandoned at shutdown: {}", summary.shutdown.abandoned);
    }
    if summary.interrupted {
        println!("Crawl was interrupted before completion");
    }

    println!("Elapsed: {:.2?}", summary.elapsed);
}
