//! Periodic trigger for sweeping stuck pending work back into the queue.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Something that can rediscover and reschedule pending work.
#[async_trait]
pub trait Sweeper: Send + Sync {
    type Error: std::fmt::Display + Send;

    /// Run one sweep, returning how many items were rescheduled.
    async fn sweep(&self) -> Result<usize, Self::Error>;
}

/// Calls a [`Sweeper`] on a fixed interval until shut down.
pub struct SweepScheduler<S: Sweeper + 'static> {
    sweeper: Arc<S>,
    interval: Duration,
}

impl<S: Sweeper + 'static> SweepScheduler<S> {
    pub fn new(sweeper: Arc<S>, interval: Duration) -> Self {
        Self { sweeper, interval }
    }

    /// Spawn the schedule. The first sweep runs immediately.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Sweeping pending videos every {:?}", self.interval);
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        match self.sweeper.sweep().await {
                            Ok(0) => debug!("Sweep found nothing pending"),
                            Ok(n) => info!("Sweep rescheduled {} video(s)", n),
                            Err(e) => warn!("Sweep failed: {}", e),
                        }
                    }
                }
            }

            debug!("Sweep scheduler stopped");
        })
    }
}
