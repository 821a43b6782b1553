use crate::model::{MessageId, ProductKey, QueueMessage, ReceiptHandle};
use crate::queue_actor::QueueError;
use crate::stock_actor::StockError;
use async_trait::async_trait;
use std::time::Duration;

/// A per-key counter with an atomic decrement-if-positive.
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Take one unit if any is left. `Ok(false)` means sold out and nothing changed.
    ///
    /// Must be a single indivisible step with respect to every other caller.
    async fn reserve_one(&self, key: &ProductKey) -> Result<bool, StockError>;

    /// Put back one unit. Returns the level afterwards.
    async fn release_one(&self, key: &ProductKey) -> Result<u64, StockError>;

    /// Overwrite the level. `units` must be at least 1.
    async fn set_stock(&self, key: &ProductKey, units: u64) -> Result<(), StockError>;

    /// Current level; a key that was never set reads as 0.
    async fn get_stock(&self, key: &ProductKey) -> Result<u64, StockError>;
}

/// An at-least-once queue with a visibility timeout.
#[async_trait]
pub trait DispatchQueue: Send + Sync {
    async fn enqueue(&self, body: String) -> Result<MessageId, QueueError>;

    /// Claim up to `max` messages, waiting at most `wait` for the first one.
    /// An empty batch means nothing arrived in time.
    async fn poll_batch(
        &self,
        max: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError>;

    /// Remove a message for good. `Ok(false)` when the receipt matched nothing,
    /// which includes a message that was already acknowledged.
    async fn acknowledge(&self, receipt: ReceiptHandle) -> Result<bool, QueueError>;
}
