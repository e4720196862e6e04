//! Video records tracked through the comment pipeline.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ProcessingStatus;

/// YouTube video ids are exactly 11 characters of `[A-Za-z0-9_-]`.
static VIDEO_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

/// Check whether a string has the shape of a YouTube video id.
pub fn is_valid_video_id(video_id: &str) -> bool {
    VIDEO_ID_PATTERN.is_match(video_id)
}

/// A video whose comments are collected and scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub video_id: String,
    pub status: ProcessingStatus,
    pub created_at: DateTime<Utc>,
    /// Touched on every status transition; drives the reprocessing policy.
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// A freshly requested video, waiting to be started.
    pub fn new(video_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            video_id: video_id.into(),
            status: ProcessingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether more than `threshold` has passed since the last transition.
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: chrono::Duration) -> bool {
        now - self.updated_at > threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_validation() {
        assert!(is_valid_video_id("dQw4w9WgXcQ"));
        assert!(is_valid_video_id("A1b2C3d4E-_"));
        assert!(!is_valid_video_id("short"));
        assert!(!is_valid_video_id("dQw4w9WgXcQx"));
        assert!(!is_valid_video_id("dQw4w9WgX.Q"));
        assert!(!is_valid_video_id(""));
    }

    #[test]
    fn test_staleness() {
        let created = DateTime::parse_from_rfc3339("2024-01-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let video = Video::new("dQw4w9WgXcQ", created);
        let threshold = chrono::Duration::hours(24);

        assert!(!video.is_stale(created + chrono::Duration::hours(23), threshold));
        assert!(!video.is_stale(created + threshold, threshold));
        assert!(video.is_stale(created + chrono::Duration::hours(25), threshold));
    }
}
