//! Fakes shared by pipeline and server tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};

use crate::models::{Comment, ObservedComment, ProcessingStatus, Sentiment, UpsertOutcome, Video};
use crate::repository::{EntityStore, InMemoryStore, StoreError, StoreResult};
use crate::services::{
    CommentSource, EnrichmentError, FetchError, LanguageService, RawComment, SentimentAnalyzer,
};
use crate::work_queue::{Job, JobQueue, WorkQueueError};

/// Records jobs instead of running them.
#[derive(Default)]
pub(crate) struct RecordingQueue {
    jobs: Mutex<Vec<Job>>,
}

impl RecordingQueue {
    pub(crate) fn take(&self) -> Vec<Job> {
        std::mem::take(&mut *self.jobs.lock().unwrap())
    }

    pub(crate) fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, job: Job) -> Result<(), WorkQueueError> {
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

/// Serves canned comments and counts how many were pulled.
#[derive(Default)]
pub(crate) struct FakeSource {
    comments: Mutex<HashMap<String, Vec<Result<RawComment, String>>>>,
    pulled: Arc<AtomicUsize>,
}

impl FakeSource {
    pub(crate) fn set(&self, video_id: &str, items: Vec<Result<RawComment, String>>) {
        self.comments
            .lock()
            .unwrap()
            .insert(video_id.to_string(), items);
    }

    pub(crate) fn pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }
}

impl CommentSource for FakeSource {
    fn fetch<'a>(&'a self, video_id: &'a str) -> BoxStream<'a, Result<RawComment, FetchError>> {
        let items = self
            .comments
            .lock()
            .unwrap()
            .get(video_id)
            .cloned()
            .unwrap_or_default();
        let pulled = Arc::clone(&self.pulled);

        stream::iter(items)
            .inspect(move |_| {
                pulled.fetch_add(1, Ordering::SeqCst);
            })
            .map(|item| item.map_err(FetchError::Layout))
            .boxed()
    }
}

/// Wraps an [`InMemoryStore`] and fails the first few `complete_comment` calls.
pub(crate) struct FlakyStore {
    inner: InMemoryStore,
    failing_completions: AtomicUsize,
}

impl FlakyStore {
    pub(crate) fn new(inner: InMemoryStore, failing_completions: usize) -> Self {
        Self {
            inner,
            failing_completions: AtomicUsize::new(failing_completions),
        }
    }
}

#[async_trait]
impl EntityStore for FlakyStore {
    async fn get_video(&self, video_id: &str) -> StoreResult<Option<Video>> {
        self.inner.get_video(video_id).await
    }

    async fn insert_video(&self, video: &Video) -> StoreResult<bool> {
        self.inner.insert_video(video).await
    }

    async fn transition_video(
        &self,
        video_id: &str,
        from: ProcessingStatus,
        to: ProcessingStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.inner.transition_video(video_id, from, to, at).await
    }

    async fn list_videos(&self, skip: usize, limit: usize) -> StoreResult<Vec<Video>> {
        self.inner.list_videos(skip, limit).await
    }

    async fn list_videos_by_status(&self, status: ProcessingStatus) -> StoreResult<Vec<Video>> {
        self.inner.list_videos_by_status(status).await
    }

    async fn delete_video(&self, video_id: &str) -> StoreResult<bool> {
        self.inner.delete_video(video_id).await
    }

    async fn get_comment(
        &self,
        video_id: &str,
        comment_id: &str,
    ) -> StoreResult<Option<Comment>> {
        self.inner.get_comment(video_id, comment_id).await
    }

    async fn upsert_comment(&self, observed: &ObservedComment) -> StoreResult<UpsertOutcome> {
        self.inner.upsert_comment(observed).await
    }

    async fn transition_comment(
        &self,
        video_id: &str,
        comment_id: &str,
        from: ProcessingStatus,
        to: ProcessingStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.inner
            .transition_comment(video_id, comment_id, from, to, at)
            .await
    }

    async fn complete_comment(
        &self,
        video_id: &str,
        comment_id: &str,
        sentiment: Sentiment,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let failing = self
            .failing_completions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoreError::Database(
                diesel::result::Error::BrokenTransactionManager,
            ));
        }
        self.inner
            .complete_comment(video_id, comment_id, sentiment, at)
            .await
    }

    async fn delete_comment(&self, video_id: &str, comment_id: &str) -> StoreResult<bool> {
        self.inner.delete_comment(video_id, comment_id).await
    }

    async fn list_comments(
        &self,
        video_id: &str,
        skip: usize,
        limit: usize,
    ) -> StoreResult<Vec<Comment>> {
        self.inner.list_comments(video_id, skip, limit).await
    }

    async fn all_comments(&self, video_id: &str) -> StoreResult<Vec<Comment>> {
        self.inner.all_comments(video_id).await
    }
}

/// Treats text prefixed with `xx:` as language `xx`; fails on `FAIL`.
pub(crate) struct FakeLanguage;

#[async_trait]
impl LanguageService for FakeLanguage {
    async fn detect(&self, text: &str) -> Result<String, EnrichmentError> {
        if text.contains("FAIL") {
            return Err(EnrichmentError::NoLanguageDetected);
        }
        Ok(match text.split_once(':') {
            Some((lang, _)) if lang.len() == 2 => lang.to_string(),
            _ => "en".to_string(),
        })
    }

    async fn translate(
        &self,
        text: &str,
        _source: &str,
        _target: &str,
    ) -> Result<String, EnrichmentError> {
        Ok(text.split_once(':').map(|(_, t)| t).unwrap_or(text).to_string())
    }
}

/// Uses the text itself as the compound score when it parses as a number.
pub(crate) struct FakeSentiment;

impl SentimentAnalyzer for FakeSentiment {
    fn score(&self, text: &str) -> Result<Sentiment, EnrichmentError> {
        Ok(Sentiment {
            compound: text.trim().parse().unwrap_or(0.0),
            pos: 0.0,
            neu: 1.0,
            neg: 0.0,
        })
    }
}

pub(crate) fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-15T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub(crate) fn raw(cid: &str, text: &str) -> RawComment {
    RawComment {
        cid: cid.to_string(),
        text: text.to_string(),
        votes: "3".to_string(),
        replies: "1".to_string(),
        time: "2 days ago".to_string(),
        reply: cid.contains('.'),
    }
}
