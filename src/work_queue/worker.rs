//! Worker pool that drains a [`LocalJobQueue`].

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::{JobHandler, LocalJobQueue};

/// Worker pool tuning.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of concurrent workers.
    pub workers: usize,
    /// Extra attempts after the first failure.
    pub max_retries: u32,
    /// Base delay before a retry; grows linearly with the attempt number.
    pub retry_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_retries: 2,
            retry_backoff: Duration::from_secs(5),
        }
    }
}

/// Runs a fixed number of workers that claim jobs and hand them to a handler.
pub struct WorkerPool<H: JobHandler + 'static> {
    queue: Arc<LocalJobQueue>,
    handler: Arc<H>,
    config: WorkerConfig,
}

impl<H: JobHandler + 'static> WorkerPool<H> {
    pub fn new(queue: Arc<LocalJobQueue>, handler: Arc<H>, config: WorkerConfig) -> Self {
        Self {
            queue,
            handler,
            config,
        }
    }

    /// Spawn the workers. They stop when `shutdown` flips to `true`.
    pub fn spawn(&self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        (0..self.config.workers.max(1))
            .map(|worker_id| {
                let queue = Arc::clone(&self.queue);
                let handler = Arc::clone(&self.handler);
                let config = self.config.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(run_worker(worker_id, queue, handler, config, shutdown))
            })
            .collect()
    }

    /// Run workers until the queue is idle, then stop them.
    pub async fn drain(&self) {
        let (tx, rx) = watch::channel(false);
        let workers = self.spawn(rx);
        self.queue.wait_idle().await;
        let _ = tx.send(true);
        for worker in workers {
            let _ = worker.await;
        }
    }
}

async fn run_worker<H: JobHandler>(
    worker_id: usize,
    queue: Arc<LocalJobQueue>,
    handler: Arc<H>,
    config: WorkerConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(worker_id, "Worker started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let handle = tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            handle = queue.claim() => match handle {
                Some(handle) => handle,
                None => break,
            },
        };

        // A panicking job must still settle its handle or the queue never goes idle.
        let outcome = AssertUnwindSafe(handler.handle(&handle.job))
            .catch_unwind()
            .await;
        let result = match outcome {
            Ok(result) => result,
            Err(_) => {
                error!(worker_id, job = %handle.job, "Job panicked, dropping it");
                queue.fail(handle, None);
                continue;
            }
        };

        match result {
            Ok(()) => queue.complete(handle),
            Err(e) if handle.attempt <= config.max_retries => {
                let delay = config.retry_backoff * handle.attempt;
                warn!(
                    worker_id,
                    job = %handle.job,
                    attempt = handle.attempt,
                    "Job failed, retrying in {:?}: {}",
                    delay,
                    e
                );
                queue.fail(handle, Some(delay));
            }
            Err(e) => {
                error!(
                    worker_id,
                    job = %handle.job,
                    attempt = handle.attempt,
                    "Job failed permanently: {}",
                    e
                );
                queue.fail(handle, None);
            }
        }
    }

    debug!(worker_id, "Worker stopped");
}
