//! Video intake, listing, and deletion endpoints.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::super::AppState;
use super::helpers::{error_response, PageParams};

#[derive(Debug, Deserialize)]
pub struct VideoRequest {
    pub video_id: String,
}

/// Register a video for processing.
pub async fn request_video(
    State(state): State<AppState>,
    Json(body): Json<VideoRequest>,
) -> Response {
    match state.pipeline.request_video(&body.video_id).await {
        Ok(video) => Json(video).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn get_video(State(state): State<AppState>, Path(video_id): Path<String>) -> Response {
    match state.pipeline.get_video(&video_id).await {
        Ok(video) => Json(video).into_response(),
        Err(e) => error_response(e),
    }
}

/// Delete a video and its comments.
pub async fn delete_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Response {
    match state.pipeline.delete_video(&video_id).await {
        Ok(()) => Json(serde_json::json!({ "message": "Video deleted" })).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn list_videos(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Response {
    match state
        .pipeline
        .list_videos(params.skip(), params.limit())
        .await
    {
        Ok(videos) => Json(videos).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Response {
    match state
        .pipeline
        .list_comments(&video_id, params.skip(), params.limit())
        .await
    {
        Ok(comments) => Json(comments).into_response(),
        Err(e) => error_response(e),
    }
}
