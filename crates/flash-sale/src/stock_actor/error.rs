//! Error types for the stock store.

use thiserror::Error;

/// Errors raised by any [`StockStore`](crate::clients::StockStore) backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StockError {
    /// Stock can only be set to a positive number of units.
    #[error("Invalid stock count: {0}")]
    InvalidQuantity(u64),

    /// The store could not be reached (closed actor, dropped reply).
    #[error("Stock store unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with an error.
    #[error("Stock backend error: {0}")]
    Backend(String),
}

impl From<String> for StockError {
    fn from(msg: String) -> Self {
        StockError::Unavailable(msg)
    }
}
