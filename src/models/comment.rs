//! Comment records and their sentiment scores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ProcessingStatus;

/// VADER polarity scores for a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// Normalized, weighted composite score in `[-1, 1]`.
    pub compound: f64,
    pub pos: f64,
    pub neu: f64,
    pub neg: f64,
}

/// A comment belonging to a video.
///
/// `(video_id, comment_id)` is unique. Re-observing the same pair updates
/// the record in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub video_id: String,
    pub comment_id: String,
    /// Thread root for replies (`parent.child` raw ids), `None` otherwise.
    pub comment_parent_id: Option<String>,
    pub text: String,
    pub votes: i64,
    pub replies: i64,
    /// Publication time exactly as the source displayed it.
    pub time_posted_raw: String,
    /// Best-effort parse of `time_posted_raw`.
    pub time_posted: Option<DateTime<Utc>>,
    pub status: ProcessingStatus,
    /// Present once the comment is `Processed`.
    pub sentiment: Option<Sentiment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalized fields of a comment as observed during a fetch.
///
/// Upserting one of these either inserts a new `Pending` comment or
/// overwrites the mutable fields of an existing one.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedComment {
    pub video_id: String,
    pub comment_id: String,
    pub comment_parent_id: Option<String>,
    pub text: String,
    pub votes: i64,
    pub replies: i64,
    pub time_posted_raw: String,
    pub time_posted: Option<DateTime<Utc>>,
    pub observed_at: DateTime<Utc>,
}

impl ObservedComment {
    /// The record a first observation creates.
    pub fn into_comment(self) -> Comment {
        Comment {
            video_id: self.video_id,
            comment_id: self.comment_id,
            comment_parent_id: self.comment_parent_id,
            text: self.text,
            votes: self.votes,
            replies: self.replies,
            time_posted_raw: self.time_posted_raw,
            time_posted: self.time_posted,
            status: ProcessingStatus::Pending,
            sentiment: None,
            created_at: self.observed_at,
            updated_at: self.observed_at,
        }
    }
}

/// Whether an upsert created a new comment or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}
