//! YouTube comment sources.
//!
//! A [`CommentSource`] turns a video id into a lazy stream of raw comments
//! in the provider's ranking order. Consumers that stop polling stop the
//! underlying network traffic.

mod downloader;

pub use downloader::{DownloaderOptions, YoutubeCommentDownloader};

use futures::stream::BoxStream;
use thiserror::Error;

/// A comment exactly as the provider reports it.
///
/// Counts are kept as display strings; callers coerce them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawComment {
    /// Provider comment id. Replies look like `parent.child`.
    pub cid: String,
    pub text: String,
    /// Like count as displayed.
    pub votes: String,
    /// Reply count as displayed.
    pub replies: String,
    /// Publication time as displayed, e.g. `3 days ago`.
    pub time: String,
    pub reply: bool,
}

/// Errors raised while pulling comments.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Unexpected page layout: {0}")]
    Layout(String),

    #[error("Error returned from server: {0}")]
    Server(String),
}

/// Source of raw comments for a video.
pub trait CommentSource: Send + Sync {
    /// Lazily stream the comments of `video_id`, most popular first.
    ///
    /// The stream may yield an error at any point; nothing is fetched
    /// until it is polled.
    fn fetch<'a>(&'a self, video_id: &'a str) -> BoxStream<'a, Result<RawComment, FetchError>>;
}
