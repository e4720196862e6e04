//! HTTP request handlers for the web server.

mod helpers;
mod root;
mod score;
mod videos;

pub use root::{health, root};
pub use score::score_video;
pub use videos::{delete_video, get_video, list_comments, list_videos, request_video};
