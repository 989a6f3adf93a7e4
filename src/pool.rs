//! Bounded worker pool for provider calls.
//!
//! Wraps a `JoinSet` behind a semaphore so that at most `permits` tasks
//! run their body at any instant. The permit is acquired inside the
//! spawned task and released when its future completes, so queued tasks
//! cost nothing but memory until a slot frees up.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::error;

pub struct WorkerPool<T> {
    semaphore: Arc<Semaphore>,
    tasks: JoinSet<T>,
}

impl<T: Send + 'static> WorkerPool<T> {
    pub fn new(permits: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(permits.max(1))),
            tasks: JoinSet::new(),
        }
    }

    /// Spawn a task; it waits for a permit before running its body.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let semaphore = self.semaphore.clone();
        self.tasks.spawn(async move {
            // The semaphore is never closed while the pool is alive
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("worker pool semaphore closed");
            task.await
        });
    }

    /// Wait for the next task to complete, in completion order.
    ///
    /// Returns `None` once every task has been drained. Panicked or
    /// aborted tasks are logged and skipped.
    pub async fn join_next(&mut self) -> Option<T> {
        while let Some(result) = self.tasks.join_next().await {
            match result {
                Ok(outcome) => return Some(outcome),
                Err(e) if e.is_cancelled() => continue,
                Err(e) => {
                    error!("Worker task panicked: {}", e);
                    continue;
                }
            }
        }
        None
    }

    /// Cancel every outstanding task. In-flight tasks stop at their next
    /// await point; queued tasks never run.
    pub fn abort_all(&mut self) {
        self.tasks.abort_all();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
