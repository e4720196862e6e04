//! Comment fan-out: pull a video's comments and schedule scoring.

use std::num::ParseIntError;

use futures::StreamExt;
use tracing::{debug, error, info, warn};

use super::Pipeline;
use crate::error::ServiceResult;
use crate::models::{ObservedComment, ProcessingStatus, UpsertOutcome};
use crate::services::{parse_time_posted, RawComment};
use crate::work_queue::Job;

/// Split a raw comment id into `(parent_id, comment_id)`.
///
/// Replies are reported as `parent.child`; only the first `.` separates.
pub fn split_comment_id(cid: &str, reply: bool) -> (Option<String>, String) {
    if reply {
        if let Some((parent, child)) = cid.split_once('.') {
            return (Some(parent.to_string()), child.to_string());
        }
    }
    (None, cid.to_string())
}

/// Parse a displayed count.
pub fn parse_count(raw: &str) -> Result<i64, ParseIntError> {
    raw.trim().parse()
}

impl Pipeline {
    /// Pull comments for a processing video and fan out scoring jobs.
    ///
    /// Source failures end the video as `Failed` and are not returned.
    /// Store and queue failures are returned so the job can be retried.
    pub(crate) async fn fetch_comments(&self, video_id: &str) -> ServiceResult<()> {
        let Some(video) = self.store.get_video(video_id).await? else {
            warn!(video_id, "Video not found, skipping fetch");
            return Ok(());
        };

        if video.status != ProcessingStatus::Processing {
            debug!(video_id, status = %video.status, "Video is not processing, skipping fetch");
            return Ok(());
        }

        info!(video_id, max = self.config.max_comments, "Pulling comments");

        let mut comments = self.source.fetch(video_id).take(self.config.max_comments);
        let mut inserted = 0usize;
        let mut updated = 0usize;

        while let Some(item) = comments.next().await {
            let raw = match item {
                Ok(raw) => raw,
                Err(e) => {
                    error!(video_id, "Error pulling comments: {}", e);
                    drop(comments);
                    self.finish_video(video_id, ProcessingStatus::Failed).await?;
                    return Ok(());
                }
            };

            let observed = self.observe(video_id, raw);
            match self.store.upsert_comment(&observed).await? {
                UpsertOutcome::Inserted => {
                    debug!(video_id, comment_id = %observed.comment_id, "Inserted comment");
                    self.queue
                        .enqueue(Job::ScoreComment {
                            video_id: video_id.to_string(),
                            comment_id: observed.comment_id,
                        })
                        .await?;
                    inserted += 1;
                }
                UpsertOutcome::Updated => {
                    debug!(video_id, comment_id = %observed.comment_id, "Updated comment");
                    updated += 1;
                }
            }
        }

        if inserted + updated >= self.config.max_comments {
            debug!(video_id, "Reached max comments per video");
        }

        self.finish_video(video_id, ProcessingStatus::Processed).await?;
        info!(video_id, inserted, updated, "Finished pulling comments");
        Ok(())
    }

    /// Normalize a raw comment. Never fails: bad fields become defaults.
    fn observe(&self, video_id: &str, raw: RawComment) -> ObservedComment {
        let now = self.now();
        let (comment_parent_id, comment_id) = split_comment_id(&raw.cid, raw.reply);

        let time_posted = parse_time_posted(&raw.time, now);
        if time_posted.is_none() && !raw.time.trim().is_empty() {
            debug!(video_id, %comment_id, time = %raw.time, "Unparseable comment time");
        }

        ObservedComment {
            video_id: video_id.to_string(),
            comment_id,
            comment_parent_id,
            text: raw.text,
            votes: parse_count(&raw.votes).unwrap_or_default(),
            replies: parse_count(&raw.replies).unwrap_or_default(),
            time_posted_raw: raw.time,
            time_posted,
            observed_at: now,
        }
    }

    /// Move a processing video to its final status.
    async fn finish_video(&self, video_id: &str, status: ProcessingStatus) -> ServiceResult<()> {
        let moved = self
            .store
            .transition_video(video_id, ProcessingStatus::Processing, status, self.now())
            .await?;
        if !moved {
            warn!(video_id, %status, "Video left processing before fetch finished");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_comment_id() {
        assert_eq!(
            split_comment_id("UgxA.r1", true),
            (Some("UgxA".to_string()), "r1".to_string())
        );
        assert_eq!(
            split_comment_id("UgxA.r1.x", true),
            (Some("UgxA".to_string()), "r1.x".to_string())
        );
        assert_eq!(split_comment_id("UgxA", false), (None, "UgxA".to_string()));
        assert_eq!(split_comment_id("UgxA", true), (None, "UgxA".to_string()));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("42").unwrap(), 42);
        assert_eq!(parse_count(" 7 ").unwrap(), 7);
        assert!(parse_count("1.2K").is_err());
        assert!(parse_count("").is_err());
        assert_eq!(parse_count("1.2K").unwrap_or_default(), 0);
    }
}
