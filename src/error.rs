//! Errors surfaced by pipeline operations to their callers.

use thiserror::Error;

use crate::repository::StoreError;
use crate::work_queue::WorkQueueError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid YouTube video ID")]
    InvalidVideoId,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    IncompleteData(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Queue(#[from] WorkQueueError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
