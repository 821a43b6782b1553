//! Error types for the reservation path.

use crate::stock_actor::StockError;
use std::time::Duration;
use thiserror::Error;

/// Why a purchase attempt (or an admin call) did not complete.
///
/// Sold out is not an error; it is [`PurchaseOutcome::SoldOut`](super::PurchaseOutcome::SoldOut).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReservationError {
    #[error("Stock store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Stock store did not answer within {0:?}")]
    StoreTimeout(Duration),

    #[error("Invalid stock count: {0}")]
    InvalidQuantity(u64),

    /// A unit was reserved but the order never reached the queue. `compensated`
    /// tells whether the unit was put back.
    #[error("Order hand-off failed ({reason}), unit released: {compensated}")]
    Handoff { reason: String, compensated: bool },

    /// The queue did not answer in time. The enqueue keeps running and its unit is
    /// released only if it ends up failing.
    #[error("Order hand-off still pending after {0:?}")]
    HandoffPending(Duration),
}

impl ReservationError {
    /// Whether the caller may simply try again.
    pub fn is_transient(&self) -> bool {
        !matches!(self, ReservationError::InvalidQuantity(_))
    }
}

impl From<StockError> for ReservationError {
    fn from(e: StockError) -> Self {
        match e {
            StockError::InvalidQuantity(units) => ReservationError::InvalidQuantity(units),
            other => ReservationError::StoreUnavailable(other.to_string()),
        }
    }
}
