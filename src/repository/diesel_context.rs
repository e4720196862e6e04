//! Diesel database context for managing the connection pool and repository access.
//!
//! Provides the SQLite-backed [`EntityStore`] used by the service and CLI.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::diesel_comment::DieselCommentRepository;
use super::diesel_video::DieselVideoRepository;
use super::migrations::run_migrations;
use super::pool::{DbPool, DieselError};
use super::util::{to_diesel_error, validate_database_url};
use super::{EntityStore, StoreResult};
use crate::models::{Comment, ObservedComment, ProcessingStatus, Sentiment, UpsertOutcome, Video};

/// Diesel database context that owns the pool and hands out repositories.
///
/// # Example
/// ```ignore
/// let ctx = DieselDbContext::from_url("sqlite:thumbsense.db")?;
/// ctx.init_schema().await?;
/// let video = ctx.videos().get("dQw4w9WgXcQ").await?;
/// ```
#[derive(Clone)]
pub struct DieselDbContext {
    pool: DbPool,
}

impl DieselDbContext {
    /// Create a new database context from a database URL.
    ///
    /// Accepts `sqlite:path/to/db.sqlite`, `sqlite:///abs/path.db` or a bare path.
    pub fn from_url(database_url: &str) -> Result<Self, DieselError> {
        validate_database_url(database_url).map_err(to_diesel_error)?;
        Ok(Self {
            pool: DbPool::new(database_url),
        })
    }

    /// Create a new database context from a SQLite file path.
    pub fn from_sqlite_path(db_path: &Path) -> Result<Self, DieselError> {
        Ok(Self {
            pool: DbPool::from_path(db_path),
        })
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Get a video repository.
    pub fn videos(&self) -> DieselVideoRepository {
        DieselVideoRepository::new(self.pool.clone())
    }

    /// Get a comment repository.
    pub fn comments(&self) -> DieselCommentRepository {
        DieselCommentRepository::new(self.pool.clone())
    }

    /// Create the database file if needed and apply pending migrations.
    pub async fn init_schema(&self) -> Result<Vec<String>, DieselError> {
        if let Some(parent) = Path::new(self.pool.database_url()).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(to_diesel_error)?;
            }
        }
        run_migrations(self.pool.database_url()).await
    }

    /// Get list of all tables in the database.
    pub async fn list_tables(&self) -> Result<Vec<String>, DieselError> {
        use diesel_async::RunQueryDsl;

        let mut conn = self.pool.get().await?;
        let rows: Vec<TableName> = diesel::sql_query(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .load(&mut conn)
        .await?;
        Ok(rows.into_iter().map(|r| r.name).collect())
    }
}

#[derive(diesel::QueryableByName)]
struct TableName {
    #[diesel(sql_type = diesel::sql_types::Text)]
    name: String,
}

#[async_trait]
impl EntityStore for DieselDbContext {
    async fn get_video(&self, video_id: &str) -> StoreResult<Option<Video>> {
        Ok(self.videos().get(video_id).await?)
    }

    async fn insert_video(&self, video: &Video) -> StoreResult<bool> {
        Ok(self.videos().insert(video).await?)
    }

    async fn transition_video(
        &self,
        video_id: &str,
        from: ProcessingStatus,
        to: ProcessingStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        Ok(self.videos().transition(video_id, from, to, at).await?)
    }

    async fn list_videos(&self, skip: usize, limit: usize) -> StoreResult<Vec<Video>> {
        Ok(self.videos().list(skip, limit).await?)
    }

    async fn list_videos_by_status(&self, status: ProcessingStatus) -> StoreResult<Vec<Video>> {
        Ok(self.videos().list_by_status(status).await?)
    }

    async fn delete_video(&self, video_id: &str) -> StoreResult<bool> {
        Ok(self.videos().delete(video_id).await?)
    }

    async fn get_comment(
        &self,
        video_id: &str,
        comment_id: &str,
    ) -> StoreResult<Option<Comment>> {
        Ok(self.comments().get(video_id, comment_id).await?)
    }

    async fn upsert_comment(&self, observed: &ObservedComment) -> StoreResult<UpsertOutcome> {
        Ok(self.comments().upsert(observed).await?)
    }

    async fn transition_comment(
        &self,
        video_id: &str,
        comment_id: &str,
        from: ProcessingStatus,
        to: ProcessingStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        Ok(self
            .comments()
            .transition(video_id, comment_id, from, to, at)
            .await?)
    }

    async fn complete_comment(
        &self,
        video_id: &str,
        comment_id: &str,
        sentiment: Sentiment,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        Ok(self
            .comments()
            .complete(video_id, comment_id, sentiment, at)
            .await?)
    }

    async fn delete_comment(&self, video_id: &str, comment_id: &str) -> StoreResult<bool> {
        Ok(self.comments().delete(video_id, comment_id).await?)
    }

    async fn list_comments(
        &self,
        video_id: &str,
        skip: usize,
        limit: usize,
    ) -> StoreResult<Vec<Comment>> {
        Ok(self.comments().list_for_video(video_id, skip, limit).await?)
    }

    async fn all_comments(&self, video_id: &str) -> StoreResult<Vec<Comment>> {
        Ok(self.comments().all_for_video(video_id).await?)
    }
}
