// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::error;

/// Bounded fan-out of per-scene work.
///
/// Every item gets its own task, but at most `max_concurrency` of them run
/// at once regardless of how many scenes a job has. Results come back in
/// input order. A task that panics leaves `None` in its position so the
/// caller can substitute a fallback for just that scene.
///
/// Dropping the future returned by [`WorkerPool::map`] aborts all of its
/// tasks, which is how cancellation reaches in-flight backend calls.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
}

impl WorkerPool {
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub async fn map<I, T, F, Fut>(&self, items: Vec<I>, work: F) -> Vec<Option<T>>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(usize, I) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let count = items.len();
        let mut tasks = JoinSet::new();

        for (index, item) in items.into_iter().enumerate() {
            let semaphore = Arc::clone(&self.semaphore);
            let job = work(index, item);
            tasks.spawn(async move {
                // The semaphore is never closed, so acquiring only waits.
                let _permit = semaphore.acquire_owned().await.ok();
                (index, job.await)
            });
        }

        let mut results: Vec<Option<T>> = (0..count).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, value)) => results[index] = Some(value),
                Err(join_error) => error!(error = %join_error, "Scene task did not complete"),
            }
        }
        results
    }
}
