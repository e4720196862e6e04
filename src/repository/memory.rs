//! In-memory entity store for single-process operation.
//!
//! State is not persisted across restarts. All operations take a single
//! lock, so each compare-and-set is atomic with respect to the others.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{EntityStore, StoreResult};
use crate::models::{Comment, ObservedComment, ProcessingStatus, Sentiment, UpsertOutcome, Video};

#[derive(Debug, Default)]
struct State {
    /// Insertion order.
    videos: Vec<Video>,
    /// Insertion order.
    comments: Vec<Comment>,
}

impl State {
    fn video_mut(&mut self, video_id: &str) -> Option<&mut Video> {
        self.videos.iter_mut().find(|v| v.video_id == video_id)
    }

    fn comment_mut(&mut self, video_id: &str, comment_id: &str) -> Option<&mut Comment> {
        self.comments
            .iter_mut()
            .find(|c| c.video_id == video_id && c.comment_id == comment_id)
    }
}

/// Entity store held entirely in memory.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn get_video(&self, video_id: &str) -> StoreResult<Option<Video>> {
        let state = self.state.read().await;
        Ok(state.videos.iter().find(|v| v.video_id == video_id).cloned())
    }

    async fn insert_video(&self, video: &Video) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.video_mut(&video.video_id).is_some() {
            return Ok(false);
        }
        state.videos.push(video.clone());
        Ok(true)
    }

    async fn transition_video(
        &self,
        video_id: &str,
        from: ProcessingStatus,
        to: ProcessingStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        match state.video_mut(video_id) {
            Some(video) if video.status == from => {
                video.status = to;
                video.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_videos(&self, skip: usize, limit: usize) -> StoreResult<Vec<Video>> {
        let state = self.state.read().await;
        Ok(state.videos.iter().skip(skip).take(limit).cloned().collect())
    }

    async fn list_videos_by_status(&self, status: ProcessingStatus) -> StoreResult<Vec<Video>> {
        let state = self.state.read().await;
        Ok(state
            .videos
            .iter()
            .filter(|v| v.status == status)
            .cloned()
            .collect())
    }

    async fn delete_video(&self, video_id: &str) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let before = state.videos.len();
        state.videos.retain(|v| v.video_id != video_id);
        if state.videos.len() == before {
            return Ok(false);
        }
        state.comments.retain(|c| c.video_id != video_id);
        Ok(true)
    }

    async fn get_comment(
        &self,
        video_id: &str,
        comment_id: &str,
    ) -> StoreResult<Option<Comment>> {
        let state = self.state.read().await;
        Ok(state
            .comments
            .iter()
            .find(|c| c.video_id == video_id && c.comment_id == comment_id)
            .cloned())
    }

    async fn upsert_comment(&self, observed: &ObservedComment) -> StoreResult<UpsertOutcome> {
        let mut state = self.state.write().await;
        match state.comment_mut(&observed.video_id, &observed.comment_id) {
            Some(existing) => {
                existing.text = observed.text.clone();
                existing.votes = observed.votes;
                existing.replies = observed.replies;
                existing.time_posted_raw = observed.time_posted_raw.clone();
                existing.time_posted = observed.time_posted;
                existing.status = ProcessingStatus::Pending;
                existing.updated_at = observed.observed_at;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                state.comments.push(observed.clone().into_comment());
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn transition_comment(
        &self,
        video_id: &str,
        comment_id: &str,
        from: ProcessingStatus,
        to: ProcessingStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        match state.comment_mut(video_id, comment_id) {
            Some(comment) if comment.status == from => {
                comment.status = to;
                comment.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete_comment(
        &self,
        video_id: &str,
        comment_id: &str,
        sentiment: Sentiment,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        match state.comment_mut(video_id, comment_id) {
            Some(comment) if comment.status == ProcessingStatus::Processing => {
                comment.status = ProcessingStatus::Processed;
                comment.sentiment = Some(sentiment);
                comment.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_comment(&self, video_id: &str, comment_id: &str) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let before = state.comments.len();
        state
            .comments
            .retain(|c| !(c.video_id == video_id && c.comment_id == comment_id));
        Ok(state.comments.len() != before)
    }

    async fn list_comments(
        &self,
        video_id: &str,
        skip: usize,
        limit: usize,
    ) -> StoreResult<Vec<Comment>> {
        let state = self.state.read().await;
        Ok(state
            .comments
            .iter()
            .filter(|c| c.video_id == video_id)
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn all_comments(&self, video_id: &str) -> StoreResult<Vec<Comment>> {
        let state = self.state.read().await;
        Ok(state
            .comments
            .iter()
            .filter(|c| c.video_id == video_id)
            .cloned()
            .collect())
    }
}
