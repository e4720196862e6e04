//! Diesel-based comment repository for SQLite.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::diesel_models::{CommentRecord, NewComment};
use super::page_bounds;
use super::pool::{DbPool, DieselError};
use super::{parse_datetime, parse_datetime_opt};
use crate::models::{Comment, ObservedComment, ProcessingStatus, Sentiment, UpsertOutcome};
use crate::schema::comments;

/// Convert a database record to a domain model.
impl TryFrom<CommentRecord> for Comment {
    type Error = diesel::result::Error;

    fn try_from(record: CommentRecord) -> Result<Self, Self::Error> {
        let sentiment = record
            .sentiment
            .as_deref()
            .map(serde_json::from_str::<Sentiment>)
            .transpose()
            .map_err(|e| diesel::result::Error::DeserializationError(Box::new(e)))?;

        Ok(Comment {
            status: ProcessingStatus::from_str(&record.status).ok_or_else(|| {
                diesel::result::Error::DeserializationError(
                    format!("Invalid comment status: '{}'", record.status).into(),
                )
            })?,
            video_id: record.video_id,
            comment_id: record.comment_id,
            comment_parent_id: record.comment_parent_id,
            text: record.text,
            votes: record.votes,
            replies: record.replies,
            time_posted_raw: record.time_posted_raw,
            time_posted: parse_datetime_opt(record.time_posted),
            sentiment,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        })
    }
}

/// Diesel-based comment repository.
#[derive(Clone)]
pub struct DieselCommentRepository {
    pool: DbPool,
}

impl DieselCommentRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a comment by its natural key.
    pub async fn get(
        &self,
        video_id: &str,
        comment_id: &str,
    ) -> Result<Option<Comment>, DieselError> {
        let mut conn = self.pool.get().await?;

        comments::table
            .filter(comments::video_id.eq(video_id))
            .filter(comments::comment_id.eq(comment_id))
            .select(CommentRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .and_then(|opt| opt.map(Comment::try_from).transpose())
    }

    /// Insert a pending comment, or refresh the observed fields of an
    /// existing one and reset it to pending.
    pub async fn upsert(&self, observed: &ObservedComment) -> Result<UpsertOutcome, DieselError> {
        let mut conn = self.pool.get().await?;

        let observed_at = observed.observed_at.to_rfc3339();
        let time_posted = observed.time_posted.map(|dt| dt.to_rfc3339());
        let pending = ProcessingStatus::Pending.as_str();

        conn.transaction(|conn| {
            Box::pin(async move {
                let inserted = diesel::insert_or_ignore_into(comments::table)
                    .values(&NewComment {
                        video_id: &observed.video_id,
                        comment_id: &observed.comment_id,
                        comment_parent_id: observed.comment_parent_id.as_deref(),
                        text: &observed.text,
                        votes: observed.votes,
                        replies: observed.replies,
                        time_posted_raw: &observed.time_posted_raw,
                        time_posted: time_posted.as_deref(),
                        status: pending,
                        created_at: &observed_at,
                        updated_at: &observed_at,
                    })
                    .execute(conn)
                    .await?;

                if inserted > 0 {
                    return Ok(UpsertOutcome::Inserted);
                }

                diesel::update(
                    comments::table
                        .filter(comments::video_id.eq(&observed.video_id))
                        .filter(comments::comment_id.eq(&observed.comment_id)),
                )
                .set((
                    comments::text.eq(&observed.text),
                    comments::votes.eq(observed.votes),
                    comments::replies.eq(observed.replies),
                    comments::time_posted_raw.eq(&observed.time_posted_raw),
                    comments::time_posted.eq(time_posted.as_deref()),
                    comments::status.eq(pending),
                    comments::updated_at.eq(&observed_at),
                ))
                .execute(conn)
                .await?;

                Ok(UpsertOutcome::Updated)
            })
        })
        .await
    }

    /// Compare-and-set the status of a comment.
    pub async fn transition(
        &self,
        video_id: &str,
        comment_id: &str,
        from: ProcessingStatus,
        to: ProcessingStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::update(
            comments::table
                .filter(comments::video_id.eq(video_id))
                .filter(comments::comment_id.eq(comment_id))
                .filter(comments::status.eq(from.as_str())),
        )
        .set((
            comments::status.eq(to.as_str()),
            comments::updated_at.eq(at.to_rfc3339()),
        ))
        .execute(&mut conn)
        .await?;

        Ok(rows > 0)
    }

    /// Store a sentiment on a comment that is still processing.
    pub async fn complete(
        &self,
        video_id: &str,
        comment_id: &str,
        sentiment: Sentiment,
        at: DateTime<Utc>,
    ) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let sentiment_json = serde_json::to_string(&sentiment)
            .map_err(|e| diesel::result::Error::SerializationError(Box::new(e)))?;

        let rows = diesel::update(
            comments::table
                .filter(comments::video_id.eq(video_id))
                .filter(comments::comment_id.eq(comment_id))
                .filter(comments::status.eq(ProcessingStatus::Processing.as_str())),
        )
        .set((
            comments::status.eq(ProcessingStatus::Processed.as_str()),
            comments::sentiment.eq(Some(sentiment_json)),
            comments::updated_at.eq(at.to_rfc3339()),
        ))
        .execute(&mut conn)
        .await?;

        Ok(rows > 0)
    }

    /// Delete a single comment.
    pub async fn delete(&self, video_id: &str, comment_id: &str) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::delete(
            comments::table
                .filter(comments::video_id.eq(video_id))
                .filter(comments::comment_id.eq(comment_id)),
        )
        .execute(&mut conn)
        .await?;

        Ok(rows > 0)
    }

    /// List a page of a video's comments in insertion order.
    pub async fn list_for_video(
        &self,
        video_id: &str,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Comment>, DieselError> {
        let mut conn = self.pool.get().await?;
        let (offset, limit) = page_bounds(skip, limit);

        comments::table
            .filter(comments::video_id.eq(video_id))
            .order(comments::id.asc())
            .offset(offset)
            .limit(limit)
            .select(CommentRecord::as_select())
            .load(&mut conn)
            .await
            .and_then(|records| records.into_iter().map(Comment::try_from).collect())
    }

    /// Load every comment of a video in insertion order.
    pub async fn all_for_video(&self, video_id: &str) -> Result<Vec<Comment>, DieselError> {
        let mut conn = self.pool.get().await?;

        comments::table
            .filter(comments::video_id.eq(video_id))
            .order(comments::id.asc())
            .select(CommentRecord::as_select())
            .load(&mut conn)
            .await
            .and_then(|records| records.into_iter().map(Comment::try_from).collect())
    }
}
