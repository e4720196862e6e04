//! Data models for thumbsense.

mod comment;
mod score;
mod status;
mod video;

pub use comment::{Comment, ObservedComment, Sentiment, UpsertOutcome};
pub use score::SentimentSummary;
pub use status::ProcessingStatus;
pub use video::{is_valid_video_id, Video};
