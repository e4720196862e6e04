//! Work queue for the pipeline's background jobs.
//!
//! Every unit of work (starting a video, fetching its comments, scoring one
//! comment) is a [`Job`]. Producers only see the [`JobQueue`] seam; the
//! in-process [`LocalJobQueue`] adds the claim/complete/fail lifecycle that
//! [`WorkerPool`] drives, and [`SweepScheduler`] periodically feeds it.
//!
//! Delivery is at-least-once. Handlers must tolerate seeing a job twice.

mod error;
mod handle;
pub mod local;
pub mod scheduler;
pub mod worker;

pub use error::WorkQueueError;
pub use handle::WorkHandle;
pub use local::LocalJobQueue;
pub use scheduler::{SweepScheduler, Sweeper};
pub use worker::{WorkerConfig, WorkerPool};

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A unit of background work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Job {
    /// Move a pending video to processing and schedule its fetch.
    StartVideo { video_id: String },
    /// Pull comments for a processing video and fan out scoring jobs.
    FetchComments { video_id: String },
    /// Translate and score one comment.
    ScoreComment {
        video_id: String,
        comment_id: String,
    },
}

impl Job {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StartVideo { .. } => "start_video",
            Self::FetchComments { .. } => "fetch_comments",
            Self::ScoreComment { .. } => "score_comment",
        }
    }

    pub fn video_id(&self) -> &str {
        match self {
            Self::StartVideo { video_id }
            | Self::FetchComments { video_id }
            | Self::ScoreComment { video_id, .. } => video_id,
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScoreComment {
                video_id,
                comment_id,
            } => write!(f, "{}({}/{})", self.kind(), video_id, comment_id),
            _ => write!(f, "{}({})", self.kind(), self.video_id()),
        }
    }
}

/// Somewhere jobs can be submitted for later execution.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Submit a job. Returns once the queue has accepted it.
    async fn enqueue(&self, job: Job) -> Result<(), WorkQueueError>;
}

/// Executes jobs taken off a queue.
#[async_trait]
pub trait JobHandler: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run one job. An error makes the job eligible for retry.
    async fn handle(&self, job: &Job) -> Result<(), Self::Error>;
}
