//! Error types for the dispatch queue.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueueError {
    #[error("Batch size must be between 1 and {max}, got {requested}")]
    InvalidBatchSize { requested: usize, max: usize },

    #[error("Long-poll wait must be at most {max:?}, got {requested:?}")]
    InvalidWait { requested: Duration, max: Duration },

    /// The queue could not be reached (closed actor, dropped reply).
    #[error("Queue unavailable: {0}")]
    Unavailable(String),

    #[error("Queue backend error: {0}")]
    Backend(String),
}

impl From<String> for QueueError {
    fn from(msg: String) -> Self {
        QueueError::Unavailable(msg)
    }
}
