//! Bounded worker pool.
//!
//! Rust concept: an `OwnedSemaphorePermit` is an RAII guard. Moving it into
//! the spawned task means the slot is released on every exit path,
//! including a panic.

use crate::error::{LoadError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// Default number of concurrent store sessions
pub const DEFAULT_WORKERS: usize = 8;

/// Runs async jobs with at most `size` of them in flight
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl WorkerPool {
    /// Create a pool; a size of zero is raised to one
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `job` once per item and wait for all of them.
    ///
    /// Returning from this call is the phase barrier: every job has either
    /// finished or failed. Results come back in completion order. A job that
    /// panics is reported as `LoadError::TaskFailed`; the other jobs keep
    /// running.
    ///
    /// # Arguments
    /// * `items` - One input per job
    /// * `job` - Builds the future for one item
    pub async fn run_all<I, F, Fut, T>(&self, items: I, job: F) -> Vec<Result<T>>
    where
        I: IntoIterator,
        I::Item: Send + 'static,
        F: Fn(I::Item) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let job = Arc::new(job);
        let mut tasks = JoinSet::new();
        let mut results = Vec::new();

        for item in items {
            // Waiting here keeps at most `size` tasks spawned at once
            let permit = match Arc::clone(&self.permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(closed) => {
                    results.push(Err(LoadError::TaskFailed(closed.to_string())));
                    continue;
                }
            };
            let job = Arc::clone(&job);
            tasks.spawn(async move {
                let _permit = permit;
                job(item).await
            });
        }

        debug!(pending = tasks.len(), "Waiting for workers");
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(join_error) => {
                    error!(error = %join_error, "Worker task failed");
                    results.push(Err(LoadError::TaskFailed(join_error.to_string())));
                }
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_never_exceeds_pool_size() {
        let pool = WorkerPool::new(3);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            pool.run_all(0..20, move |_| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await
        };

        assert_eq!(results.len(), 20);
        assert!(results.iter().all(|r| r.is_ok()));
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(running.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panicking_job_becomes_task_failed() {
        let pool = WorkerPool::new(2);
        let results = pool
            .run_all(0..4, |n: u32| async move {
                if n == 2 {
                    panic!("boom");
                }
                Ok(n)
            })
            .await;

        let failed = results
            .iter()
            .filter(|r| matches!(r, Err(LoadError::TaskFailed(_))))
            .count();
        assert_eq!(results.len(), 4);
        assert_eq!(failed, 1);
    }

    #[test]
    fn test_zero_size_is_raised_to_one() {
        assert_eq!(WorkerPool::new(0).size(), 1);
        assert_eq!(WorkerPool::default().size(), DEFAULT_WORKERS);
    }
}
