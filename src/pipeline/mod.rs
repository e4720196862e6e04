//! Pipeline controller: video intake, comment fan-out, enrichment, scoring.
//!
//! The controller holds no locks of its own. Every step reloads the entity
//! it acts on and guards its side effects with a compare-and-set on the
//! status field, so any job can be delivered more than once.
//!
//! ```text
//! request_video ──▶ StartVideo ──▶ FetchComments ──▶ ScoreComment × new comments
//! sweep_pending ─────────────────▶ FetchComments
//! ```

mod enrich;
mod fetch;
mod intake;
mod score;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{parse_count, split_comment_id};

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ServiceError;
use crate::repository::EntityStore;
use crate::services::{CommentSource, Enricher};
use crate::work_queue::{Job, JobHandler, JobQueue, Sweeper};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map(|guard| *guard)
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// Tunables for the controller.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upper bound on comments consumed per fetch.
    pub max_comments: usize,
    /// A finished video older than this is reprocessed on the next request.
    pub reprocess_after: chrono::Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_comments: 1000,
            reprocess_after: chrono::Duration::hours(24),
        }
    }
}

/// Orchestrates videos and comments through their status machines.
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<dyn EntityStore>,
    source: Arc<dyn CommentSource>,
    enricher: Enricher,
    queue: Arc<dyn JobQueue>,
    clock: Arc<dyn Clock>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn EntityStore>,
        source: Arc<dyn CommentSource>,
        enricher: Enricher,
        queue: Arc<dyn JobQueue>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            source,
            enricher,
            queue,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the clock used for timestamps and staleness checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

#[async_trait]
impl JobHandler for Pipeline {
    type Error = ServiceError;

    async fn handle(&self, job: &Job) -> Result<(), ServiceError> {
        match job {
            Job::StartVideo { video_id } => self.start_video(video_id).await,
            Job::FetchComments { video_id } => self.fetch_comments(video_id).await,
            Job::ScoreComment {
                video_id,
                comment_id,
            } => self.score_comment(video_id, comment_id).await,
        }
    }
}

#[async_trait]
impl Sweeper for Pipeline {
    type Error = ServiceError;

    async fn sweep(&self) -> Result<usize, ServiceError> {
        self.sweep_pending().await
    }
}
