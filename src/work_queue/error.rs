//! Work queue error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkQueueError {
    #[error("Queue is closed")]
    Closed,
}
