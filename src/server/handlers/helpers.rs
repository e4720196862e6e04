//! Shared handler helpers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::error::ServiceError;

/// Page size when the client does not ask for one.
const DEFAULT_LIMIT: usize = 10;

/// `?skip=&limit=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

impl PageParams {
    pub fn skip(&self) -> usize {
        self.skip.unwrap_or(0)
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

/// Map a pipeline error to a `{"detail": ...}` response.
pub fn error_response(err: ServiceError) -> Response {
    let status = match err {
        ServiceError::InvalidVideoId => StatusCode::BAD_REQUEST,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::IncompleteData(_) | ServiceError::Store(_) | ServiceError::Queue(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    }

    (
        status,
        Json(serde_json::json!({ "detail": err.to_string() })),
    )
        .into_response()
}
