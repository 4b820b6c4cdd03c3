//! Fixed-size worker pool
//!
//! Units of work are spawned onto the tokio runtime and each must hold a
//! permit from a semaphore of `size` permits while it runs, so at most `size`
//! units execute at once. Every submitted unit is tracked in a `JoinSet`,
//! which makes the number of completions to wait for exactly the number of
//! units still outstanding, however many admission passes submitted them.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

/// How a unit of work ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Finished,
    Panicked,
    Cancelled,
}

/// Outcome of shutting the pool down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Units that finished during the grace period
    pub completed: usize,
    /// Units still running when the grace period ran out
    pub abandoned: usize,
}

pub struct WorkerPool {
    size: usize,
    slots: Arc<Semaphore>,
    tasks: JoinSet<()>,
    accepting: bool,
}

impl WorkerPool {
    /// Creates a pool with `size` execution slots (at least one)
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            slots: Arc::new(Semaphore::new(size)),
            tasks: JoinSet::new(),
            accepting: true,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Submits a unit of work
    ///
    /// Returns false, dropping the unit, once shutdown has begun.
    pub fn submit<F>(&mut self, unit: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.accepting {
            tracing::warn!("Worker pool is shutting down, rejecting unit of work");
            return false;
        }

        let slots = self.slots.clone();
        self.tasks.spawn(async move {
            // Only fails on a closed semaphore, and this one is never closed
            let Ok(_permit) = slots.acquire_owned().await else {
                return;
            };
            unit.await;
        });
        true
    }

    /// Number of submitted units that have not completed yet
    pub fn outstanding(&self) -> usize {
        self.tasks.len()
    }

    /// Number of units currently holding an execution slot
    pub fn running(&self) -> usize {
        self.size - self.slots.available_permits()
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for one submitted unit to complete
    ///
    /// Returns `None` when nothing is outstanding.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        let result = self.tasks.join_next().await?;
        Some(classify(result))
    }

    /// Stops accepting work and waits up to `grace` for outstanding units
    ///
    /// Units still running after the grace period are aborted. Their side
    /// effects up to that point are not rolled back.
    pub async fn shutdown(&mut self, grace: Duration) -> ShutdownReport {
        self.shutdown_or(grace, std::future::pending()).await
    }

    /// Like `shutdown`, but stops waiting as soon as `force` resolves
    pub async fn shutdown_or<S>(&mut self, grace: Duration, force: S) -> ShutdownReport
    where
        S: Future<Output = ()>,
    {
        self.accepting = false;
        tokio::pin!(force);

        let outstanding = self.tasks.len();
        if outstanding > 0 {
            tracing::info!(
                "Waiting up to {:?} for {} outstanding units",
                grace,
                outstanding
            );
        }

        let deadline = tokio::time::Instant::now() + grace;
        let mut completed = 0;
        while !self.tasks.is_empty() {
            tokio::select! {
                joined = tokio::time::timeout_at(deadline, self.tasks.join_next()) => {
                    match joined {
                        Ok(Some(result)) => {
                            classify(result);
                            completed += 1;
                        }
                        Ok(None) | Err(_) => break,
                    }
                }
                _ = &mut force => {
                    tracing::warn!("Shutdown forced before the grace period ran out");
                    break;
                }
            }
        }

        let abandoned = self.tasks.len();
        if abandoned > 0 {
            tracing::warn!("Abandoning {} units still running", abandoned);
            self.tasks.abort_all();
            self.tasks.detach_all();
        }

        ShutdownReport {
            completed,
            abandoned,
        }
    }
}

fn classify(result: Result<(), JoinError>) -> Completion {
    match result {
        Ok(()) => Completion::Finished,
        Err(e) if e.is_panic() => {
            tracing::error!("Unit of work panicked: {}", e);
            Completion::Panicked
        }
        Err(_) => Completion::Cancelled,
    }
}
