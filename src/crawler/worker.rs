//! One unit of work: fetch an address, record it, offer its links

use crate::crawler::fetcher::{FetchedPage, PageFetcher};
use crate::crawler::frontier::{Admission, Frontier};
use crate::output::CrawlStats;
use crate::storage::{PageRecord, ResultStore};
use chrono::Local;
use std::sync::Arc;

/// Shared handles every unit of work runs against
pub(crate) struct WorkerContext<F> {
    pub fetcher: Arc<F>,
    pub frontier: Arc<Frontier>,
    pub store: Arc<ResultStore>,
    pub stats: Arc<CrawlStats>,
}

impl<F> Clone for WorkerContext<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            frontier: self.frontier.clone(),
            store: self.store.clone(),
            stats: self.stats.clone(),
        }
    }
}

/// Processes a single admitted address
///
/// A failed fetch is logged and the address dropped without retry. A failed
/// save is logged; the record stays in the store's memory.
pub(crate) async fn process_address<F: PageFetcher>(ctx: WorkerContext<F>, address: String) {
    tracing::debug!("Fetching {}", address);

    let page = match ctx.fetcher.fetch(&address).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!("Failed to crawl {}: {}", address, e);
            ctx.stats.record_fetch_failure();
            return;
        }
    };
    ctx.stats.record_fetched();

    let record = build_record(&address, &page);
    match ctx.store.append(record).await {
        Ok(count) => tracing::info!("Saved {} ({} records)", address, count),
        Err(e) => {
            tracing::warn!("Failed to save results after {}: {}", address, e);
            ctx.stats.record_save_failure();
        }
    }

    offer_links(&ctx, &address, &page.links);
}

fn build_record(address: &str, page: &FetchedPage) -> PageRecord {
    PageRecord::new(
        address,
        page.title.as_str(),
        page.description.as_str(),
        &page.headers,
        Local::now(),
    )
}

/// Offers discovered links until the frontier stops admitting
fn offer_links<F>(ctx: &WorkerContext<F>, from: &str, links: &[String]) {
    let mut offered = 0;
    let mut admitted = 0;

    for link in links {
        offered += 1;
        match ctx.frontier.admit(link) {
            Admission::Admitted => {
                tracing::debug!("Admitted {} (from {})", link, from);
                admitted += 1;
            }
            Admission::AlreadyVisited => {}
            Admission::BudgetExhausted => {
                tracing::debug!(
                    "Page budget reached, ignoring remaining {} links from {}",
                    links.len() - offered,
                    from
                );
                break;
            }
        }
    }

    ctx.stats.record_links(offered as u64, admitted as u64);
}
