//! Bounded parallel fan-out with result-order reconstruction.
//!
//! A fixed number of workers pull item indices from a shared queue, report
//! `(index, result)` pairs over a channel sized to the input, and the
//! collector writes them into a slot array addressed by origin index. The
//! output order therefore follows the input order no matter in which order
//! the workers finish.
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct FanOut {
    workers: usize,
}

impl Default for FanOut {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl FanOut {
    /// Creates a pool running at most `workers` tasks at once (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `task` for every item and returns one slot per item in input
    /// order.
    ///
    /// A slot is `None` only if the task handling it panicked.
    pub async fn run<T, O, E, F, Fut>(&self, items: Vec<T>, task: F) -> Vec<Option<Result<O, E>>>
    where
        T: Send + Sync + 'static,
        O: Send + 'static,
        E: Send + 'static,
        F: Fn(&T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, E>> + Send + 'static,
    {
        let len = items.len();
        let mut slots: Vec<Option<Result<O, E>>> =
            std::iter::repeat_with(|| None).take(len).collect();
        if len == 0 {
            return slots;
        }

        let items = Arc::new(items);
        let task = Arc::new(task);
        let next = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = tokio::sync::mpsc::channel::<(usize, Result<O, E>)>(len);

        let mut workers = tokio::task::JoinSet::new();
        for _ in 0..self.workers.min(len) {
            let items = Arc::clone(&items);
            let task = Arc::clone(&task);
            let next = Arc::clone(&next);
            let tx = tx.clone();
            workers.spawn(async move {
                loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(item) = items.get(index) else {
                        break;
                    };
                    let result = (*task)(item).await;
                    if tx.send((index, result)).await.is_err() {
                        break;
                    }
                }
            });
        }
        // The channel closes once every worker has dropped its sender.
        drop(tx);

        while let Some((index, result)) = rx.recv().await {
            slots[index] = Some(result);
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                log::error!("fan-out worker failed: {err}");
            }
        }

        slots
    }
}

/// Drops failed and missing slots, logging each failure with `what`.
pub fn compact<O, E: Display>(slots: Vec<Option<Result<O, E>>>, what: &str) -> Vec<O> {
    let mut out = Vec::with_capacity(slots.len());
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(Ok(value)) => out.push(value),
            Some(Err(err)) => log::warn!("skipping {what} #{index}: {err}"),
            None => log::warn!("skipping {what} #{index}: task did not report a result"),
        }
    }
    out
}
