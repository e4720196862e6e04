//! Aggregated sentiment for a video.

use serde::{Deserialize, Serialize};

/// Summary statistics over the compound scores of a video's processed
/// comments.
///
/// The standard deviation is the sample deviation (n - 1). With a single
/// comment it is NaN, which serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub video_id: String,
    pub comment_count: usize,
    pub sentiment_score: f64,
    pub sentiment_score_std: f64,
    pub sentiment_score_min: f64,
    pub sentiment_score_max: f64,
}
