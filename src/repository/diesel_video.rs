//! Diesel-based video repository for SQLite.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::diesel_models::{NewVideo, VideoRecord};
use super::page_bounds;
use super::parse_datetime;
use super::pool::{DbPool, DieselError};
use crate::models::{ProcessingStatus, Video};
use crate::schema::{comments, videos};

/// Convert a database record to a domain model.
impl TryFrom<VideoRecord> for Video {
    type Error = diesel::result::Error;

    fn try_from(record: VideoRecord) -> Result<Self, Self::Error> {
        Ok(Video {
            status: ProcessingStatus::from_str(&record.status).ok_or_else(|| {
                diesel::result::Error::DeserializationError(
                    format!("Invalid video status: '{}'", record.status).into(),
                )
            })?,
            video_id: record.video_id,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        })
    }
}

/// Diesel-based video repository.
#[derive(Clone)]
pub struct DieselVideoRepository {
    pool: DbPool,
}

impl DieselVideoRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a video by ID.
    pub async fn get(&self, video_id: &str) -> Result<Option<Video>, DieselError> {
        let mut conn = self.pool.get().await?;

        videos::table
            .find(video_id)
            .select(VideoRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .and_then(|opt| opt.map(Video::try_from).transpose())
    }

    /// Insert a video if no row with its ID exists.
    pub async fn insert(&self, video: &Video) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let created_at = video.created_at.to_rfc3339();
        let updated_at = video.updated_at.to_rfc3339();

        let rows = diesel::insert_or_ignore_into(videos::table)
            .values(&NewVideo {
                video_id: &video.video_id,
                status: video.status.as_str(),
                created_at: &created_at,
                updated_at: &updated_at,
            })
            .execute(&mut conn)
            .await?;

        Ok(rows > 0)
    }

    /// Compare-and-set the status of a video.
    pub async fn transition(
        &self,
        video_id: &str,
        from: ProcessingStatus,
        to: ProcessingStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::update(
            videos::table
                .filter(videos::video_id.eq(video_id))
                .filter(videos::status.eq(from.as_str())),
        )
        .set((
            videos::status.eq(to.as_str()),
            videos::updated_at.eq(at.to_rfc3339()),
        ))
        .execute(&mut conn)
        .await?;

        Ok(rows > 0)
    }

    /// List videos, oldest first.
    pub async fn list(&self, skip: usize, limit: usize) -> Result<Vec<Video>, DieselError> {
        let mut conn = self.pool.get().await?;
        let (offset, limit) = page_bounds(skip, limit);

        videos::table
            .order((videos::created_at.asc(), videos::video_id.asc()))
            .offset(offset)
            .limit(limit)
            .select(VideoRecord::as_select())
            .load(&mut conn)
            .await
            .and_then(|records| records.into_iter().map(Video::try_from).collect())
    }

    /// List videos in a given status, oldest first.
    pub async fn list_by_status(&self, status: ProcessingStatus) -> Result<Vec<Video>, DieselError> {
        let mut conn = self.pool.get().await?;

        videos::table
            .filter(videos::status.eq(status.as_str()))
            .order((videos::created_at.asc(), videos::video_id.asc()))
            .select(VideoRecord::as_select())
            .load(&mut conn)
            .await
            .and_then(|records| records.into_iter().map(Video::try_from).collect())
    }

    /// Delete a video together with its comments.
    pub async fn delete(&self, video_id: &str) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        conn.transaction(|conn| {
            Box::pin(async move {
                diesel::delete(comments::table.filter(comments::video_id.eq(video_id)))
                    .execute(conn)
                    .await?;

                let rows = diesel::delete(videos::table.find(video_id))
                    .execute(conn)
                    .await?;

                Ok(rows > 0)
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::migrations::run_migrations;
    use tempfile::tempdir;

    async fn setup() -> (DieselVideoRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = db_path.display().to_string();
        run_migrations(&url).await.unwrap();
        (DieselVideoRepository::new(DbPool::new(&url)), dir)
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[tokio::test]
    async fn test_insert_is_idempotent() {
        let (repo, _dir) = setup().await;
        let video = Video::new("dQw4w9WgXcQ", at("2024-01-01T00:00:00Z"));

        assert!(repo.insert(&video).await.unwrap());
        assert!(!repo.insert(&video).await.unwrap());

        let loaded = repo.get("dQw4w9WgXcQ").await.unwrap().unwrap();
        assert_eq!(loaded, video);
    }

    #[tokio::test]
    async fn test_transition_only_from_expected_state() {
        let (repo, _dir) = setup().await;
        let created = at("2024-01-01T00:00:00Z");
        let later = at("2024-01-01T01:00:00Z");
        repo.insert(&Video::new("dQw4w9WgXcQ", created))
            .await
            .unwrap();

        let moved = repo
            .transition(
                "dQw4w9WgXcQ",
                ProcessingStatus::Pending,
                ProcessingStatus::Processing,
                later,
            )
            .await
            .unwrap();
        assert!(moved);

        let again = repo
            .transition(
                "dQw4w9WgXcQ",
                ProcessingStatus::Pending,
                ProcessingStatus::Processing,
                later,
            )
            .await
            .unwrap();
        assert!(!again);

        let loaded = repo.get("dQw4w9WgXcQ").await.unwrap().unwrap();
        assert_eq!(loaded.status, ProcessingStatus::Processing);
        assert_eq!(loaded.updated_at, later);
        assert_eq!(loaded.created_at, created);
    }

    #[tokio::test]
    async fn test_list_by_status_and_paging() {
        let (repo, _dir) = setup().await;
        for (i, id) in ["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc"].iter().enumerate() {
            let created = at("2024-01-01T00:00:00Z") + chrono::Duration::minutes(i as i64);
            repo.insert(&Video::new(*id, created)).await.unwrap();
        }
        repo.transition(
            "bbbbbbbbbbb",
            ProcessingStatus::Pending,
            ProcessingStatus::Failed,
            at("2024-01-02T00:00:00Z"),
        )
        .await
        .unwrap();

        let pending = repo.list_by_status(ProcessingStatus::Pending).await.unwrap();
        let ids: Vec<_> = pending.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["aaaaaaaaaaa", "ccccccccccc"]);

        let page = repo.list(1, 10).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].video_id, "bbbbbbbbbbb");
    }

    #[tokio::test]
    async fn test_delete_missing_video() {
        let (repo, _dir) = setup().await;
        assert!(!repo.delete("dQw4w9WgXcQ").await.unwrap());
    }
}
