use async_trait::async_trait;
use flash_sale::clients::{DispatchQueue, QueueClient};
use flash_sale::model::{BuyerId, MessageId, OrderIntent, ProductId, QueueMessage, ReceiptHandle};
use flash_sale::queue_actor::{self, QueueError, QueueSettings};
use flash_sale::worker::{CycleReport, FulfillmentWorker, MemorySink, WorkerConfig};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn order_body(buyer: &str) -> String {
    OrderIntent::new(BuyerId::new(buyer), ProductId::default())
        .to_body()
        .unwrap()
}

/// Hands out pre-scripted batches, one per poll, and records acknowledgments.
#[derive(Default)]
struct ScriptedQueue {
    batches: Mutex<VecDeque<Vec<QueueMessage>>>,
    acks: Mutex<Vec<ReceiptHandle>>,
}

impl ScriptedQueue {
    fn deliver(&self, batch: Vec<QueueMessage>) {
        self.batches.lock().unwrap().push_back(batch);
    }
}

#[async_trait]
impl DispatchQueue for ScriptedQueue {
    async fn enqueue(&self, _body: String) -> Result<MessageId, QueueError> {
        Ok(MessageId::new())
    }

    async fn poll_batch(
        &self,
        _max: usize,
        _wait: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        Ok(self.batches.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn acknowledge(&self, receipt: ReceiptHandle) -> Result<bool, QueueError> {
        self.acks.lock().unwrap().push(receipt);
        Ok(true)
    }
}

#[tokio::test]
async fn test_same_message_twice_has_one_effect_and_two_acks() {
    let queue = Arc::new(ScriptedQueue::default());
    let sink = MemorySink::new();
    let mut worker =
        FulfillmentWorker::new(queue.clone(), Arc::new(sink.clone()), WorkerConfig::default());

    let id = MessageId::new();
    let body = order_body("erin");
    for receive_count in 1..=2 {
        queue.deliver(vec![QueueMessage {
            id,
            body: body.clone(),
            receipt: ReceiptHandle::new(),
            receive_count,
        }]);
    }

    let first = worker.run_cycle().await.unwrap();
    let second = worker.run_cycle().await.unwrap();

    assert_eq!(first.processed, 1);
    assert_eq!(
        second,
        CycleReport {
            received: 1,
            duplicates: 1,
            acknowledged: 1,
            ..CycleReport::default()
        }
    );
    assert_eq!(sink.len(), 1);
    assert_eq!(queue.acks.lock().unwrap().len(), 2);
    assert!(worker.processed().contains(&id));
}

/// Real queue whose first acknowledgment is lost on the way.
struct LossyAck {
    inner: QueueClient,
    dropped: AtomicBool,
}

#[async_trait]
impl DispatchQueue for LossyAck {
    async fn enqueue(&self, body: String) -> Result<MessageId, QueueError> {
        self.inner.enqueue(body).await
    }

    async fn poll_batch(
        &self,
        max: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        self.inner.poll_batch(max, wait).await
    }

    async fn acknowledge(&self, receipt: ReceiptHandle) -> Result<bool, QueueError> {
        if !self.dropped.swap(true, Ordering::SeqCst) {
            return Err(QueueError::Unavailable("connection reset".to_string()));
        }
        self.inner.acknowledge(receipt).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_redelivery_after_lost_ack_is_skipped_and_removed() {
    let (actor, client) = queue_actor::new();
    tokio::spawn(actor.run(QueueSettings {
        visibility_timeout: Duration::from_secs(5),
        max_receive_count: Some(5),
    }));
    let queue = QueueClient::new(client, "orders");
    let lossy = Arc::new(LossyAck {
        inner: queue.clone(),
        dropped: AtomicBool::new(false),
    });
    let sink = MemorySink::new();
    let config = WorkerConfig {
        wait: Duration::from_secs(10),
        ..WorkerConfig::default()
    };
    let mut worker = FulfillmentWorker::new(lossy.clone(), Arc::new(sink.clone()), config);

    let id = lossy.enqueue(order_body("frank")).await.unwrap();

    let first = worker.run_cycle().await.unwrap();
    assert_eq!(first.processed, 1);
    assert_eq!(first.acknowledged, 0);
    assert_eq!(queue.depth().await.unwrap().in_flight, 1);

    // The long poll waits out the visibility timeout and gets the message again.
    let second = worker.run_cycle().await.unwrap();
    assert_eq!(second.duplicates, 1);
    assert_eq!(second.acknowledged, 1);

    assert_eq!(sink.len(), 1);
    assert_eq!(sink.orders()[0].0, id);
    assert_eq!(queue.depth().await.unwrap().live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_poison_message_ends_in_dead_letters() {
    let (actor, client) = queue_actor::new();
    tokio::spawn(actor.run(QueueSettings {
        visibility_timeout: Duration::from_secs(1),
        max_receive_count: Some(2),
    }));
    let queue = QueueClient::new(client, "orders");
    let sink = MemorySink::new();
    let config = WorkerConfig {
        wait: Duration::from_secs(2),
        ..WorkerConfig::default()
    };
    let mut worker =
        FulfillmentWorker::new(Arc::new(queue.clone()), Arc::new(sink.clone()), config);

    queue.enqueue("{\"broken\":".to_string()).await.unwrap();

    for _ in 0..2 {
        let report = worker.run_cycle().await.unwrap();
        assert_eq!(report.failed, 1);
    }
    let last = worker.run_cycle().await.unwrap();
    assert_eq!(last.received, 0);

    let depth = queue.depth().await.unwrap();
    assert_eq!(depth.live(), 0);
    assert_eq!(depth.dead_lettered, 1);
    assert!(sink.is_empty());
}

/// Fails the first few polls.
struct Unreliable {
    polls: AtomicUsize,
    failures: usize,
}

#[async_trait]
impl DispatchQueue for Unreliable {
    async fn enqueue(&self, _body: String) -> Result<MessageId, QueueError> {
        Ok(MessageId::new())
    }

    async fn poll_batch(
        &self,
        _max: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst);
        if poll < self.failures {
            return Err(QueueError::Unavailable("network unreachable".to_string()));
        }
        tokio::time::sleep(wait).await;
        Ok(Vec::new())
    }

    async fn acknowledge(&self, _receipt: ReceiptHandle) -> Result<bool, QueueError> {
        Ok(true)
    }
}

#[tokio::test(start_paused = true)]
async fn test_poll_errors_do_not_stop_the_loop() {
    let queue = Arc::new(Unreliable {
        polls: AtomicUsize::new(0),
        failures: 3,
    });
    let config = WorkerConfig {
        wait: Duration::from_secs(20),
        retry_interval: Duration::from_secs(1),
        ..WorkerConfig::default()
    };
    let worker = FulfillmentWorker::new(queue.clone(), Arc::new(MemorySink::new()), config);
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(worker.run(shutdown.clone()));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!handle.is_finished());
    assert_eq!(queue.polls.load(Ordering::SeqCst), 4);

    // Cancellation cuts the 20 s long poll short.
    let started = tokio::time::Instant::now();
    shutdown.cancel();
    handle.await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
}
