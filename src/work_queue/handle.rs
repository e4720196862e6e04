//! Work handle: a claimed job together with its delivery attempt.

use super::Job;

/// A claimed job. Consumed by `complete()` or `fail()` on the queue.
///
/// If dropped while still claimed, logs a warning; the queue will never
/// see the job settle and `wait_idle` will not return.
#[derive(Debug)]
pub struct WorkHandle {
    pub job: Job,
    /// 1 for the first delivery, incremented on each requeue.
    pub attempt: u32,
    pub(crate) settled: bool,
}

impl WorkHandle {
    pub(crate) fn new(job: Job, attempt: u32) -> Self {
        Self {
            job,
            attempt,
            settled: false,
        }
    }

    /// Mark this handle as settled and hand back the job.
    pub(crate) fn settle(mut self) -> (Job, u32) {
        self.settled = true;
        (self.job.clone(), self.attempt)
    }
}

impl Drop for WorkHandle {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(
                job = %self.job,
                "WorkHandle dropped without being completed or failed"
            );
        }
    }
}
