//! Sentiment summary endpoint.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};

use super::super::AppState;
use super::helpers::error_response;

pub async fn score_video(State(state): State<AppState>, Path(video_id): Path<String>) -> Response {
    match state.pipeline.score_video(&video_id).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => error_response(e),
    }
}
