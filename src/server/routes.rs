//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Intake
        .route("/request", post(handlers::request_video))
        .route("/request/", post(handlers::request_video))
        // Videos and their comments
        .route("/videos", get(handlers::list_videos))
        .route(
            "/video/:video_id",
            get(handlers::get_video).delete(handlers::delete_video),
        )
        .route("/video/:video_id/comments", get(handlers::list_comments))
        // Scores
        .route("/score/video/:video_id", get(handlers::score_video))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
