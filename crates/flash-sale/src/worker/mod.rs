//! # Fulfillment Worker
//!
//! Drains the dispatch queue: poll a batch, skip what was already handled, persist the
//! rest, acknowledge.
//!
//! ```text
//! Idle ─▶ Polling ─▶ for each message: CheckDuplicate ─▶ Skip | Process ─▶ Acknowledge ─▶ Idle
//! ```
//!
//! ## Per-message rules
//!
//! | Situation | Effect | Acknowledged |
//! |-----------|--------|--------------|
//! | New id, persisted | once | yes |
//! | Id in [`ProcessedIdSet`] | none | yes (or it would come back forever) |
//! | Persist failed or timed out | rolled back from the set | no, redelivered later |
//! | Body is not an order | none | no, the queue dead-letters it eventually |
//! | Same id twice in one batch | first copy only | second copy is left for redelivery |
//!
//! Dedup decisions are taken one message at a time by the worker loop, which owns the
//! set. Persisting and acknowledging then run in one task per message, so a slow
//! message does not hold back the acknowledgment of the others.
//!
//! ## Loop
//!
//! [`FulfillmentWorker::run`] polls until its [`CancellationToken`] fires. Poll errors are
//! logged and retried after `retry_interval`; nothing a poll can fail with stops the
//! loop. Cancellation interrupts both the long-poll and the retry sleep.

pub mod dedup;
pub mod sink;

pub use dedup::ProcessedIdSet;
pub use sink::{LogSink, MemorySink, OrderSink, SinkError};

use crate::clients::DispatchQueue;
use crate::model::{MessageId, OrderIntent, QueueMessage, ReceiptHandle};
use crate::queue_actor::QueueError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Messages per poll, 1..=10.
    pub batch_size: usize,
    /// Long-poll wait, at most 20 seconds.
    pub wait: Duration,
    /// Upper bound for persisting one message, and separately for acknowledging it.
    pub process_timeout: Duration,
    /// Pause after a failed poll.
    pub retry_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            wait: Duration::from_secs(20),
            process_timeout: Duration::from_secs(10),
            retry_interval: Duration::from_secs(1),
        }
    }
}

/// What one poll cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub received: usize,
    pub processed: usize,
    pub duplicates: usize,
    pub deferred: usize,
    pub failed: usize,
    pub acknowledged: usize,
}

enum Settlement {
    Processed { acknowledged: bool },
    Duplicate { acknowledged: bool },
    Failed,
}

pub struct FulfillmentWorker {
    queue: Arc<dyn DispatchQueue>,
    sink: Arc<dyn OrderSink>,
    processed: ProcessedIdSet,
    config: WorkerConfig,
}

impl FulfillmentWorker {
    pub fn new(
        queue: Arc<dyn DispatchQueue>,
        sink: Arc<dyn OrderSink>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            sink,
            processed: ProcessedIdSet::new(),
            config,
        }
    }

    pub fn processed(&self) -> &ProcessedIdSet {
        &self.processed
    }

    /// Poll and settle until `shutdown` is cancelled. Returns the worker so its
    /// dedup history can be inspected.
    pub async fn run(mut self, shutdown: CancellationToken) -> Self {
        info!(
            batch_size = self.config.batch_size,
            wait = ?self.config.wait,
            "Worker listening for orders"
        );

        loop {
            let polled = tokio::select! {
                _ = shutdown.cancelled() => break,
                polled = self.queue.poll_batch(self.config.batch_size, self.config.wait) => polled,
            };

            match polled {
                Ok(batch) if batch.is_empty() => debug!("No messages"),
                Ok(batch) => {
                    let report = self.handle_batch(batch).await;
                    debug!(?report, "Cycle complete");
                }
                Err(e) => {
                    error!(error = %e, "Worker poll failed");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.config.retry_interval) => {}
                    }
                }
            }
        }

        info!(processed = self.processed.len(), "Worker stopped");
        self
    }

    /// One poll followed by settlement of whatever it returned.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, QueueError> {
        let batch = self
            .queue
            .poll_batch(self.config.batch_size, self.config.wait)
            .await?;
        Ok(self.handle_batch(batch).await)
    }

    /// Settle a received batch. Returns once every message has been either acknowledged
    /// or given up on for this delivery.
    pub async fn handle_batch(&mut self, batch: Vec<QueueMessage>) -> CycleReport {
        let mut report = CycleReport {
            received: batch.len(),
            ..CycleReport::default()
        };
        let mut settling: HashSet<MessageId> = HashSet::new();
        // task id -> (message id, whether this task owns a fresh ProcessedIdSet entry)
        let mut owners = HashMap::new();
        let mut tasks = JoinSet::new();

        for message in batch {
            let QueueMessage {
                id, body, receipt, ..
            } = message;

            if settling.contains(&id) {
                debug!(message_id = %id, "Second copy in one batch, deferred");
                report.deferred += 1;
                continue;
            }

            if self.processed.contains(&id) {
                info!(message_id = %id, "[DUPLICATE IGNORED] Message already processed in this session");
                settling.insert(id);
                let queue = self.queue.clone();
                let limit = self.config.process_timeout;
                let handle = tasks.spawn(
                    async move {
                        Settlement::Duplicate {
                            acknowledged: acknowledge(queue.as_ref(), receipt, limit).await,
                        }
                    }
                    .instrument(info_span!("settle", message_id = %id)),
                );
                owners.insert(handle.id(), (id, false));
                continue;
            }

            let order = match OrderIntent::from_body(&body) {
                Ok(order) => order,
                Err(e) => {
                    warn!(message_id = %id, error = %e, "Undecodable order left for redelivery");
                    report.failed += 1;
                    continue;
                }
            };

            self.processed.insert(id);
            settling.insert(id);
            let queue = self.queue.clone();
            let sink = self.sink.clone();
            let limit = self.config.process_timeout;
            let handle = tasks.spawn(
                async move { process(queue.as_ref(), sink.as_ref(), id, order, receipt, limit).await }
                    .instrument(info_span!("settle", message_id = %id)),
            );
            owners.insert(handle.id(), (id, true));
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, Settlement::Processed { acknowledged })) => {
                    report.processed += 1;
                    report.acknowledged += usize::from(acknowledged);
                }
                Ok((_, Settlement::Duplicate { acknowledged })) => {
                    report.duplicates += 1;
                    report.acknowledged += usize::from(acknowledged);
                }
                Ok((task, Settlement::Failed)) => {
                    report.failed += 1;
                    self.roll_back(owners.get(&task));
                }
                Err(e) => {
                    error!(error = %e, "Settlement task failed");
                    report.failed += 1;
                    self.roll_back(owners.get(&e.id()));
                }
            }
        }

        report
    }

    fn roll_back(&mut self, owner: Option<&(MessageId, bool)>) {
        if let Some((id, true)) = owner {
            self.processed.remove(id);
        }
    }
}

async fn process(
    queue: &dyn DispatchQueue,
    sink: &dyn OrderSink,
    id: MessageId,
    order: OrderIntent,
    receipt: ReceiptHandle,
    limit: Duration,
) -> Settlement {
    match timeout(limit, sink.persist(id, &order)).await {
        Ok(Ok(())) => Settlement::Processed {
            acknowledged: acknowledge(queue, receipt, limit).await,
        },
        Ok(Err(e)) => {
            warn!(error = %e, "Processing failed, message left for redelivery");
            Settlement::Failed
        }
        Err(_) => {
            warn!(limit = ?limit, "Processing timed out, message left for redelivery");
            Settlement::Failed
        }
    }
}

/// A receipt that matches nothing means the message is already gone, which is the
/// outcome an acknowledgment asks for.
async fn acknowledge(queue: &dyn DispatchQueue, receipt: ReceiptHandle, limit: Duration) -> bool {
    match timeout(limit, queue.acknowledge(receipt)).await {
        Ok(Ok(removed)) => {
            if !removed {
                debug!(%receipt, "Receipt matched no message");
            }
            true
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Acknowledge failed, message will be redelivered");
            false
        }
        Err(_) => {
            warn!("Acknowledge timed out, message will be redelivered");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BuyerId, ProductId};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records acknowledgments; never delivers anything by itself.
    #[derive(Default)]
    struct AckLog {
        acks: Mutex<Vec<ReceiptHandle>>,
    }

    #[async_trait]
    impl DispatchQueue for AckLog {
        async fn enqueue(&self, _body: String) -> Result<MessageId, QueueError> {
            Ok(MessageId::new())
        }
        async fn poll_batch(
            &self,
            _max: usize,
            _wait: Duration,
        ) -> Result<Vec<QueueMessage>, QueueError> {
            Ok(Vec::new())
        }
        async fn acknowledge(&self, receipt: ReceiptHandle) -> Result<bool, QueueError> {
            self.acks.lock().unwrap().push(receipt);
            Ok(true)
        }
    }

    /// Fails the first `failures` persists.
    struct Flaky {
        failures: Mutex<usize>,
        inner: MemorySink,
    }

    #[async_trait]
    impl OrderSink for Flaky {
        async fn persist(&self, id: MessageId, order: &OrderIntent) -> Result<(), SinkError> {
            {
                let mut failures = self.failures.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(SinkError::Unavailable("db down".to_string()));
                }
            }
            self.inner.persist(id, order).await
        }
    }

    fn delivery(id: MessageId, body: &str) -> QueueMessage {
        QueueMessage {
            id,
            body: body.to_string(),
            receipt: ReceiptHandle::new(),
            receive_count: 1,
        }
    }

    fn order_body() -> String {
        OrderIntent::new(BuyerId::new("carol"), ProductId::default())
            .to_body()
            .unwrap()
    }

    #[tokio::test]
    async fn test_failed_processing_is_retried_on_redelivery() {
        let queue = Arc::new(AckLog::default());
        let sink = MemorySink::new();
        let flaky = Arc::new(Flaky {
            failures: Mutex::new(1),
            inner: sink.clone(),
        });
        let mut worker = FulfillmentWorker::new(queue.clone(), flaky, WorkerConfig::default());
        let id = MessageId::new();

        let first = worker.handle_batch(vec![delivery(id, &order_body())]).await;
        assert_eq!(first.failed, 1);
        assert_eq!(first.acknowledged, 0);
        assert!(!worker.processed().contains(&id));

        let second = worker.handle_batch(vec![delivery(id, &order_body())]).await;
        assert_eq!(second.processed, 1);
        assert_eq!(second.acknowledged, 1);
        assert_eq!(sink.len(), 1);
        assert_eq!(queue.acks.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_not_acknowledged() {
        let queue = Arc::new(AckLog::default());
        let sink = Arc::new(MemorySink::new());
        let mut worker = FulfillmentWorker::new(queue.clone(), sink.clone(), WorkerConfig::default());

        let report = worker
            .handle_batch(vec![delivery(MessageId::new(), "{not an order")])
            .await;

        assert_eq!(report.failed, 1);
        assert!(sink.is_empty());
        assert!(queue.acks.lock().unwrap().is_empty());
        assert!(worker.processed().is_empty());
    }

    #[tokio::test]
    async fn test_second_copy_in_same_batch_is_deferred() {
        let queue = Arc::new(AckLog::default());
        let sink = Arc::new(MemorySink::new());
        let mut worker = FulfillmentWorker::new(queue.clone(), sink.clone(), WorkerConfig::default());
        let id = MessageId::new();

        let report = worker
            .handle_batch(vec![delivery(id, &order_body()), delivery(id, &order_body())])
            .await;

        assert_eq!(
            report,
            CycleReport {
                received: 2,
                processed: 1,
                duplicates: 0,
                deferred: 1,
                failed: 0,
                acknowledged: 1,
            }
        );
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_persist_times_out() {
        struct Stuck;

        #[async_trait]
        impl OrderSink for Stuck {
            async fn persist(&self, _id: MessageId, _order: &OrderIntent) -> Result<(), SinkError> {
                std::future::pending().await
            }
        }

        let queue = Arc::new(AckLog::default());
        let config = WorkerConfig {
            process_timeout: Duration::from_secs(1),
            ..WorkerConfig::default()
        };
        let mut worker = FulfillmentWorker::new(queue.clone(), Arc::new(Stuck), config);
        let id = MessageId::new();

        let report = worker.handle_batch(vec![delivery(id, &order_body())]).await;

        assert_eq!(report.failed, 1);
        assert!(!worker.processed().contains(&id));
        assert!(queue.acks.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_message_does_not_hold_back_the_rest_of_its_batch() {
        /// Never finishes persisting one particular message.
        struct StuckOn {
            id: MessageId,
            inner: MemorySink,
        }

        #[async_trait]
        impl OrderSink for StuckOn {
            async fn persist(&self, id: MessageId, order: &OrderIntent) -> Result<(), SinkError> {
                if id == self.id {
                    std::future::pending::<()>().await;
                }
                self.inner.persist(id, order).await
            }
        }

        let queue = Arc::new(AckLog::default());
        let sink = MemorySink::new();
        let stuck = delivery(MessageId::new(), &order_body());
        let quick = delivery(MessageId::new(), &order_body());
        let quick_receipt = quick.receipt;
        let mut worker = FulfillmentWorker::new(
            queue.clone(),
            Arc::new(StuckOn {
                id: stuck.id,
                inner: sink.clone(),
            }),
            WorkerConfig::default(),
        );

        let batch = worker.handle_batch(vec![stuck, quick]);
        tokio::pin!(batch);
        tokio::select! {
            _ = &mut batch => panic!("Batch settled before the stuck message timed out"),
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
        }
        assert_eq!(*queue.acks.lock().unwrap(), vec![quick_receipt]);
        assert_eq!(sink.len(), 1);

        let report = batch.await;
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.acknowledged, 1);
        assert_eq!(queue.acks.lock().unwrap().len(), 1);
    }
}
