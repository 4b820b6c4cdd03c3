//! Frontier and visited set
//!
//! Both structures sit behind one mutex so that admission (check visited,
//! check budget, mark visited, enqueue) is a single atomic step. An address is
//! marked visited when it is admitted, not when its fetch completes, so two
//! workers discovering the same link concurrently cannot both schedule it.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Outcome of offering an address to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Newly visited and queued for fetching
    Admitted,
    /// Already admitted earlier in this crawl
    AlreadyVisited,
    /// The page budget has been reached; nothing more is admitted
    BudgetExhausted,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

#[derive(Debug, Default)]
struct FrontierInner {
    queue: VecDeque<String>,
    visited: HashSet<String>,
    /// Visited addresses in admission order
    admitted: Vec<String>,
}

/// FIFO queue of admitted addresses plus the set of every address ever admitted
///
/// The visited set never grows beyond `budget`.
#[derive(Debug)]
pub struct Frontier {
    budget: usize,
    inner: Mutex<FrontierInner>,
}

impl Frontier {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            inner: Mutex::new(FrontierInner::default()),
        }
    }

    /// Offers an address, returning whether it was admitted
    pub fn offer(&self, address: &str) -> bool {
        self.admit(address).is_admitted()
    }

    /// Offers an address and reports why it was or was not admitted
    pub fn admit(&self, address: &str) -> Admission {
        let mut inner = self.lock();

        if inner.visited.contains(address) {
            return Admission::AlreadyVisited;
        }
        if inner.visited.len() >= self.budget {
            return Admission::BudgetExhausted;
        }

        inner.visited.insert(address.to_string());
        inner.admitted.push(address.to_string());
        inner.queue.push_back(address.to_string());
        Admission::Admitted
    }

    /// Removes the next queued address in FIFO order, without blocking
    pub fn take(&self) -> Option<String> {
        self.lock().queue.pop_front()
    }

    /// Number of queued addresses awaiting a fetch
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    pub fn is_visited(&self, address: &str) -> bool {
        self.lock().visited.contains(address)
    }

    /// Returns true once the budget is used up
    pub fn is_exhausted(&self) -> bool {
        self.lock().visited.len() >= self.budget
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Snapshot of the visited set in admission order
    pub fn visited(&self) -> Vec<String> {
        self.lock().admitted.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        // No critical section can leave the sets half-updated
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
