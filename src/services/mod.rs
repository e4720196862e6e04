//! External services and pure helpers used by the pipeline.
//!
//! Nothing here touches the database; the pipeline wires these together.

pub mod aggregate;
pub mod date_parse;
pub mod enrichment;
pub mod youtube;

pub use aggregate::{summarize, Summary};
pub use date_parse::parse_time_posted;
pub use enrichment::{
    Enricher, Enrichment, EnrichmentError, LanguageService, LibreTranslateClient,
    SentimentAnalyzer, VaderAnalyzer,
};
pub use youtube::{CommentSource, DownloaderOptions, FetchError, RawComment, YoutubeCommentDownloader};
