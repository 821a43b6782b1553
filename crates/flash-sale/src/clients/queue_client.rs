//! # Queue Client
//!
//! [`DispatchQueue`] over the queue actor, with long polling.
//!
//! The actor answers a `Receive` immediately, even when nothing is visible. Waiting is
//! done here: an empty poll parks on a shared [`Notify`] that every enqueue through any
//! clone of this client signals, and wakes at least every `recheck` to pick up messages
//! whose visibility timeout has run out. Dropping the future abandons the wait.

use super::traits::DispatchQueue;
use crate::model::{MessageId, QueueMessage, ReceiptHandle};
use crate::queue_actor::{
    OrderQueue, QueueAction, QueueActionResult, QueueDepth, QueueError, MAX_BATCH, MAX_WAIT,
};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct QueueClient {
    inner: ResourceClient<OrderQueue>,
    queue: String,
    arrivals: Arc<Notify>,
    recheck: Duration,
}

impl QueueClient {
    pub fn new(inner: ResourceClient<OrderQueue>, queue: impl Into<String>) -> Self {
        Self {
            inner,
            queue: queue.into(),
            arrivals: Arc::new(Notify::new()),
            recheck: Duration::from_millis(250),
        }
    }

    /// How often an idle long-poll looks again for expired claims.
    pub fn with_recheck(mut self, recheck: Duration) -> Self {
        self.recheck = recheck;
        self
    }

    pub fn queue_name(&self) -> &str {
        &self.queue
    }

    async fn act(&self, action: QueueAction) -> Result<QueueActionResult, QueueError> {
        self.inner
            .perform_action(self.queue.clone(), action)
            .await
            .map_err(Self::map_error)
    }

    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>, QueueError> {
        match self.act(QueueAction::Receive { max }).await? {
            QueueActionResult::Receive(batch) => Ok(batch),
            other => Err(unexpected(other)),
        }
    }

    /// Message counts by state.
    #[instrument(skip(self), fields(queue = %self.queue))]
    pub async fn depth(&self) -> Result<QueueDepth, QueueError> {
        match self.act(QueueAction::Depth).await? {
            QueueActionResult::Depth(depth) => Ok(depth),
            other => Err(unexpected(other)),
        }
    }

    /// Drop every message, including dead letters.
    #[instrument(skip(self), fields(queue = %self.queue))]
    pub async fn purge(&self) -> Result<(), QueueError> {
        self.inner
            .put(self.queue.clone(), ())
            .await
            .map(|_| ())
            .map_err(Self::map_error)
    }
}

#[async_trait]
impl ActorClient<OrderQueue> for QueueClient {
    type Error = QueueError;

    fn inner(&self) -> &ResourceClient<OrderQueue> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::EntityError(inner) => match inner.downcast::<QueueError>() {
                Ok(queue) => *queue,
                Err(other) => QueueError::Backend(other.to_string()),
            },
            other => QueueError::Unavailable(other.to_string()),
        }
    }
}

fn unexpected(result: QueueActionResult) -> QueueError {
    QueueError::Backend(format!("Unexpected queue action result: {:?}", result))
}

#[async_trait]
impl DispatchQueue for QueueClient {
    #[instrument(skip(self, body), fields(queue = %self.queue))]
    async fn enqueue(&self, body: String) -> Result<MessageId, QueueError> {
        match self.act(QueueAction::Enqueue(body)).await? {
            QueueActionResult::Enqueue(id) => {
                debug!(%id, "Enqueued");
                self.arrivals.notify_waiters();
                Ok(id)
            }
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self), fields(queue = %self.queue))]
    async fn poll_batch(
        &self,
        max: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        if max == 0 || max > MAX_BATCH {
            return Err(QueueError::InvalidBatchSize {
                requested: max,
                max: MAX_BATCH,
            });
        }
        if wait > MAX_WAIT {
            return Err(QueueError::InvalidWait {
                requested: wait,
                max: MAX_WAIT,
            });
        }

        let deadline = Instant::now() + wait;
        loop {
            // Register before receiving so an enqueue landing in between is not missed.
            let arrival = self.arrivals.notified();
            tokio::pin!(arrival);
            arrival.as_mut().enable();

            let batch = self.receive(max).await?;
            let now = Instant::now();
            if !batch.is_empty() || now >= deadline {
                debug!(received = batch.len(), "Poll complete");
                return Ok(batch);
            }

            let nap = (deadline - now).min(self.recheck);
            tokio::select! {
                _ = &mut arrival => {}
                _ = tokio::time::sleep(nap) => {}
            }
        }
    }

    #[instrument(skip(self), fields(queue = %self.queue))]
    async fn acknowledge(&self, receipt: ReceiptHandle) -> Result<bool, QueueError> {
        match self.act(QueueAction::Acknowledge(receipt)).await? {
            QueueActionResult::Acknowledge(removed) => Ok(removed),
            other => Err(unexpected(other)),
        }
    }
}
