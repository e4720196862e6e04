//! Per-comment enrichment.

use tracing::{debug, error, info, warn};

use super::Pipeline;
use crate::error::ServiceResult;
use crate::models::ProcessingStatus;

impl Pipeline {
    /// Translate and score one pending comment.
    ///
    /// Enrichment failures mark the comment `Failed` and are not returned.
    pub(crate) async fn score_comment(&self, video_id: &str, comment_id: &str) -> ServiceResult<()> {
        if self.store.get_video(video_id).await?.is_none() {
            warn!(video_id, comment_id, "Video not found, removing orphaned comment");
            self.store.delete_comment(video_id, comment_id).await?;
            return Ok(());
        }

        let Some(comment) = self.store.get_comment(video_id, comment_id).await? else {
            warn!(video_id, comment_id, "Comment not found");
            return Ok(());
        };

        if comment.status != ProcessingStatus::Pending {
            debug!(video_id, comment_id, status = %comment.status, "Comment is not pending");
            return Ok(());
        }

        let claimed = self
            .store
            .transition_comment(
                video_id,
                comment_id,
                ProcessingStatus::Pending,
                ProcessingStatus::Processing,
                self.now(),
            )
            .await?;
        if !claimed {
            debug!(video_id, comment_id, "Comment claimed by another worker");
            return Ok(());
        }

        let outcome = self.finish_comment(video_id, comment_id, &comment.text).await;
        if outcome.is_err() {
            // Hand the comment back so a redelivered job can claim it again.
            match self
                .store
                .transition_comment(
                    video_id,
                    comment_id,
                    ProcessingStatus::Processing,
                    ProcessingStatus::Pending,
                    self.now(),
                )
                .await
            {
                Ok(_) => debug!(video_id, comment_id, "Released comment claim"),
                Err(e) => error!(video_id, comment_id, "Failed to release comment claim: {}", e),
            }
        }
        outcome
    }

    /// Enrich a claimed comment and record the result.
    async fn finish_comment(
        &self,
        video_id: &str,
        comment_id: &str,
        text: &str,
    ) -> ServiceResult<()> {
        match self.enricher.enrich(text).await {
            Ok(enrichment) => {
                let stored = self
                    .store
                    .complete_comment(video_id, comment_id, enrichment.sentiment, self.now())
                    .await?;
                if stored {
                    info!(
                        video_id,
                        comment_id,
                        language = %enrichment.language,
                        compound = enrichment.sentiment.compound,
                        "Scored comment"
                    );
                } else {
                    warn!(video_id, comment_id, "Comment changed while scoring, result dropped");
                }
            }
            Err(e) => {
                error!(video_id, comment_id, "Error scoring comment: {}", e);
                self.store
                    .transition_comment(
                        video_id,
                        comment_id,
                        ProcessingStatus::Processing,
                        ProcessingStatus::Failed,
                        self.now(),
                    )
                    .await?;
            }
        }

        Ok(())
    }
}
