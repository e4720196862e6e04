//! HTTP API over the comment pipeline.
//!
//! Requests call straight into [`Pipeline`]; all background work happens in
//! the worker pool the caller runs alongside the server.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;

use tokio::sync::watch;

use crate::pipeline::Pipeline;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub app_name: String,
    pub version: &'static str,
}

impl AppState {
    pub fn new(pipeline: Pipeline, app_name: impl Into<String>) -> Self {
        Self {
            pipeline,
            app_name: app_name.into(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Start the web server and run until `shutdown` flips to `true`.
pub async fn serve(
    state: AppState,
    host: &str,
    port: u16,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::models::{ObservedComment, ProcessingStatus, Video};
    use crate::pipeline::testing::{t0, FakeLanguage, FakeSentiment, FakeSource, RecordingQueue};
    use crate::pipeline::PipelineConfig;
    use crate::repository::{EntityStore, InMemoryStore};
    use crate::services::Enricher;

    const VIDEO: &str = "dQw4w9WgXcQ";

    fn setup_test_app() -> (axum::Router, Arc<InMemoryStore>, Arc<RecordingQueue>) {
        let store = Arc::new(InMemoryStore::new());
        let queue = Arc::new(RecordingQueue::default());
        let enricher = Enricher::new(Arc::new(FakeLanguage), Arc::new(FakeSentiment), "en");
        let pipeline = Pipeline::new(
            store.clone(),
            Arc::new(FakeSource::default()),
            enricher,
            queue.clone(),
            PipelineConfig::default(),
        );

        let app = create_router(AppState::new(pipeline, "yt-thumbsense"));
        (app, store, queue)
    }

    /// Seed a video with processed comments scored `compounds`.
    async fn seed_scored(store: &InMemoryStore, compounds: &[f64]) {
        store.insert_video(&Video::new(VIDEO, t0())).await.unwrap();
        for (i, compound) in compounds.iter().enumerate() {
            let comment_id = format!("c{}", i);
            store
                .upsert_comment(&ObservedComment {
                    video_id: VIDEO.to_string(),
                    comment_id: comment_id.clone(),
                    comment_parent_id: None,
                    text: "text".to_string(),
                    votes: 0,
                    replies: 0,
                    time_posted_raw: String::new(),
                    time_posted: None,
                    observed_at: t0(),
                })
                .await
                .unwrap();
            store
                .transition_comment(
                    VIDEO,
                    &comment_id,
                    ProcessingStatus::Pending,
                    ProcessingStatus::Processing,
                    t0(),
                )
                .await
                .unwrap();
            store
                .complete_comment(
                    VIDEO,
                    &comment_id,
                    crate::models::Sentiment {
                        compound: *compound,
                        pos: 0.0,
                        neu: 1.0,
                        neg: 0.0,
                    },
                    t0(),
                )
                .await
                .unwrap();
        }
    }

    async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let (app, _, _) = setup_test_app();

        let (status, json) = send(app.clone(), get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["app_name"], "yt-thumbsense");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));

        let (status, json) = send(app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_request_video() {
        let (app, store, queue) = setup_test_app();

        let (status, json) = send(
            app.clone(),
            post_json("/request/", serde_json::json!({ "video_id": VIDEO })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["video_id"], VIDEO);
        assert_eq!(json["status"], "pending");
        assert!(store.get_video(VIDEO).await.unwrap().is_some());
        assert_eq!(queue.len(), 1);

        let (status, _) = send(
            app,
            post_json("/request", serde_json::json!({ "video_id": VIDEO })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_request_invalid_video() {
        let (app, _, queue) = setup_test_app();

        let (status, json) = send(
            app,
            post_json("/request/", serde_json::json!({ "video_id": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["detail"], "Invalid YouTube video ID");
        assert_eq!(queue.len(), 0);
    }

    #[tokio::test]
    async fn test_get_and_delete_video() {
        let (app, store, _) = setup_test_app();

        let (status, json) = send(app.clone(), get(&format!("/video/{}", VIDEO))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["detail"], "Video not found");

        seed_scored(&store, &[0.1]).await;

        let (status, json) = send(app.clone(), get(&format!("/video/{}", VIDEO))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["video_id"], VIDEO);

        let delete = Request::builder()
            .method("DELETE")
            .uri(format!("/video/{}", VIDEO))
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(app.clone(), delete).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Video deleted");
        assert!(store.all_comments(VIDEO).await.unwrap().is_empty());

        let delete = Request::builder()
            .method("DELETE")
            .uri(format!("/video/{}", VIDEO))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app, delete).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_videos_and_comments() {
        let (app, store, _) = setup_test_app();
        seed_scored(&store, &[0.1, 0.2, 0.3]).await;

        let (status, json) = send(app.clone(), get("/videos")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 1);

        let (status, json) = send(
            app.clone(),
            get(&format!("/video/{}/comments?skip=1&limit=5", VIDEO)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let comments = json.as_array().unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0]["comment_id"], "c1");
        assert_eq!(comments[0]["status"], "processed");

        let (_, json) = send(app, get("/videos?skip=1")).await;
        assert!(json.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_score_video() {
        let (app, store, _) = setup_test_app();
        seed_scored(&store, &[0.5, -0.2]).await;

        let (status, json) = send(app, get(&format!("/score/video/{}", VIDEO))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["video_id"], VIDEO);
        assert_eq!(json["comment_count"], 2);
        assert!((json["sentiment_score"].as_f64().unwrap() - 0.15).abs() < 1e-12);
        assert_eq!(json["sentiment_score_min"], -0.2);
        assert_eq!(json["sentiment_score_max"], 0.5);
    }

    #[tokio::test]
    async fn test_score_single_comment_std_is_null() {
        let (app, store, _) = setup_test_app();
        seed_scored(&store, &[0.4]).await;

        let (status, json) = send(app, get(&format!("/score/video/{}", VIDEO))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["sentiment_score_std"].is_null());
    }

    #[tokio::test]
    async fn test_score_errors() {
        let (app, store, _) = setup_test_app();

        let (status, _) = send(app.clone(), get("/score/video/bad")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send(app.clone(), get(&format!("/score/video/{}", VIDEO))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["detail"], "Comments not found");

        seed_scored(&store, &[0.5]).await;
        store
            .upsert_comment(&ObservedComment {
                video_id: VIDEO.to_string(),
                comment_id: "unscored".to_string(),
                comment_parent_id: None,
                text: "text".to_string(),
                votes: 0,
                replies: 0,
                time_posted_raw: String::new(),
                time_posted: None,
                observed_at: t0(),
            })
            .await
            .unwrap();
        for (from, to) in [
            (ProcessingStatus::Pending, ProcessingStatus::Processing),
            (ProcessingStatus::Processing, ProcessingStatus::Processed),
        ] {
            store
                .transition_comment(VIDEO, "unscored", from, to, t0())
                .await
                .unwrap();
        }

        let (status, json) = send(app, get(&format!("/score/video/{}", VIDEO))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["detail"], "Sentiment not calculated for all comments");
    }
}
