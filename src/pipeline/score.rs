//! On-demand sentiment summary for a video.

use super::Pipeline;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{is_valid_video_id, ProcessingStatus, SentimentSummary};
use crate::services::summarize;

impl Pipeline {
    /// Summarize the compound sentiment of a video's processed comments.
    pub async fn score_video(&self, video_id: &str) -> ServiceResult<SentimentSummary> {
        if !is_valid_video_id(video_id) {
            return Err(ServiceError::InvalidVideoId);
        }

        let processed: Vec<_> = self
            .store
            .all_comments(video_id)
            .await?
            .into_iter()
            .filter(|c| c.status == ProcessingStatus::Processed)
            .collect();

        let compounds = processed
            .iter()
            .map(|c| c.sentiment.map(|s| s.compound))
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| {
                ServiceError::IncompleteData("Sentiment not calculated for all comments".to_string())
            })?;

        let summary = summarize(&compounds)
            .ok_or_else(|| ServiceError::NotFound("Comments not found".to_string()))?;

        Ok(SentimentSummary {
            video_id: video_id.to_string(),
            comment_count: summary.count,
            sentiment_score: summary.mean,
            sentiment_score_std: summary.std,
            sentiment_score_min: summary.min,
            sentiment_score_max: summary.max,
        })
    }
}
