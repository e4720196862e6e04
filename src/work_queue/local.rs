//! In-process job queue backed by a tokio channel.
//!
//! Jobs live only in memory: anything queued when the process exits is
//! lost, and the sweep rediscovers pending videos on the next start.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex, Notify};

use super::{Job, JobQueue, WorkHandle, WorkQueueError};

type Delivery = (Job, u32);

/// Unbounded FIFO queue with claim/complete/fail semantics.
///
/// A job counts as in flight from `enqueue` until it is completed or
/// finally failed; requeued jobs stay in flight while they wait.
pub struct LocalJobQueue {
    tx: mpsc::UnboundedSender<Delivery>,
    rx: Mutex<mpsc::UnboundedReceiver<Delivery>>,
    in_flight: AtomicUsize,
    idle: Notify,
}

impl Default for LocalJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalJobQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            in_flight: AtomicUsize::new(0),
            idle: Notify::new(),
        }
    }

    /// Number of jobs queued, running, or waiting to be retried.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Wait for the next job.
    pub async fn claim(&self) -> Option<WorkHandle> {
        let mut rx = self.rx.lock().await;
        rx.recv()
            .await
            .map(|(job, attempt)| WorkHandle::new(job, attempt))
    }

    /// Mark a claimed job as done.
    pub fn complete(&self, handle: WorkHandle) {
        handle.settle();
        self.settle_one();
    }

    /// Mark a claimed job as failed.
    ///
    /// With `retry_after`, the job is delivered again after the delay with
    /// its attempt counter bumped. Without it, the job is dropped.
    pub fn fail(&self, handle: WorkHandle, retry_after: Option<Duration>) {
        let (job, attempt) = handle.settle();

        let Some(delay) = retry_after else {
            self.settle_one();
            return;
        };

        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send((job, attempt + 1));
        });
    }

    /// Wait until no job is queued, running, or waiting for a retry.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn settle_one(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

#[async_trait]
impl JobQueue for LocalJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), WorkQueueError> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if self.tx.send((job, 1)).is_err() {
            self.settle_one();
            return Err(WorkQueueError::Closed);
        }
        Ok(())
    }
}
