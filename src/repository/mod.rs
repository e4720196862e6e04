//! Repository layer for database persistence.
//!
//! The pipeline talks to storage through the [`EntityStore`] trait. The
//! production implementation is [`DieselDbContext`] over SQLite; an
//! in-memory implementation backs tests and ephemeral runs.
//!
//! Status changes are compare-and-set: a transition only applies when the
//! row is still in the expected state, so racing workers cannot both win.

pub mod diesel_comment;
pub mod diesel_context;
pub mod diesel_models;
pub mod diesel_video;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod util;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Comment, ObservedComment, ProcessingStatus, Sentiment, UpsertOutcome, Video};

pub use diesel_comment::DieselCommentRepository;
pub use diesel_context::DieselDbContext;
pub use diesel_video::DieselVideoRepository;
pub use memory::InMemoryStore;
pub use pool::{DbPool, DieselError};

/// Errors raised by entity stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence seam for videos and their comments.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Get a video by id.
    async fn get_video(&self, video_id: &str) -> StoreResult<Option<Video>>;

    /// Insert a video unless one with the same id exists.
    ///
    /// Returns `true` if the row was created.
    async fn insert_video(&self, video: &Video) -> StoreResult<bool>;

    /// Move a video from `from` to `to`, touching `updated_at`.
    ///
    /// Returns `false` without writing if the video is missing or not in `from`.
    async fn transition_video(
        &self,
        video_id: &str,
        from: ProcessingStatus,
        to: ProcessingStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Page through videos ordered by creation time.
    async fn list_videos(&self, skip: usize, limit: usize) -> StoreResult<Vec<Video>>;

    /// All videos currently in `status`.
    async fn list_videos_by_status(&self, status: ProcessingStatus) -> StoreResult<Vec<Video>>;

    /// Delete a video and all of its comments.
    ///
    /// Returns `false` if the video did not exist.
    async fn delete_video(&self, video_id: &str) -> StoreResult<bool>;

    /// Get a single comment.
    async fn get_comment(&self, video_id: &str, comment_id: &str)
        -> StoreResult<Option<Comment>>;

    /// Insert a new pending comment or refresh an existing one.
    ///
    /// Refreshing overwrites the observed fields and resets the status to
    /// `Pending`; the stored sentiment is left as is.
    async fn upsert_comment(&self, observed: &ObservedComment) -> StoreResult<UpsertOutcome>;

    /// Move a comment from `from` to `to`, touching `updated_at`.
    async fn transition_comment(
        &self,
        video_id: &str,
        comment_id: &str,
        from: ProcessingStatus,
        to: ProcessingStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Record a sentiment and move the comment from `Processing` to `Processed`.
    async fn complete_comment(
        &self,
        video_id: &str,
        comment_id: &str,
        sentiment: Sentiment,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Delete a single comment. Returns `false` if it did not exist.
    async fn delete_comment(&self, video_id: &str, comment_id: &str) -> StoreResult<bool>;

    /// Page through a video's comments in insertion order.
    async fn list_comments(
        &self,
        video_id: &str,
        skip: usize,
        limit: usize,
    ) -> StoreResult<Vec<Comment>>;

    /// All of a video's comments, in insertion order.
    async fn all_comments(&self, video_id: &str) -> StoreResult<Vec<Comment>>;
}

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

/// Clamp a page request into SQL `LIMIT`/`OFFSET` values.
pub(crate) fn page_bounds(skip: usize, limit: usize) -> (i64, i64) {
    let clamp = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
    (clamp(skip), clamp(limit))
}
