//! [`OrderQueue`] state and its [`ActorEntity`] implementation.

use super::actions::{QueueAction, QueueActionResult, QueueDepth};
use super::error::QueueError;
use super::{QueueSettings, MAX_BATCH};
use crate::model::{MessageId, QueueMessage, ReceiptHandle};
use actor_framework::ActorEntity;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct Stored {
    id: MessageId,
    body: String,
    receive_count: u32,
}

#[derive(Debug, Clone)]
struct InFlight {
    message: Stored,
    visible_at: Instant,
}

/// One named queue.
///
/// Every receipt ever issued for a live message stays valid until the message is
/// acknowledged, so an acknowledgment that arrives after the visibility timeout
/// (with the message back in `ready`, or claimed again) still removes it.
#[derive(Debug, Clone)]
pub struct OrderQueue {
    name: String,
    ready: VecDeque<Stored>,
    in_flight: HashMap<MessageId, InFlight>,
    receipts: HashMap<ReceiptHandle, MessageId>,
    dead_letters: Vec<Stored>,
}

impl OrderQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ready: VecDeque::new(),
            in_flight: HashMap::new(),
            receipts: HashMap::new(),
            dead_letters: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn depth(&self) -> QueueDepth {
        QueueDepth {
            ready: self.ready.len(),
            in_flight: self.in_flight.len(),
            dead_lettered: self.dead_letters.len(),
        }
    }

    /// Bodies parked by the redrive policy, oldest first.
    pub fn dead_letter_bodies(&self) -> Vec<&str> {
        self.dead_letters.iter().map(|m| m.body.as_str()).collect()
    }

    fn enqueue(&mut self, body: String) -> MessageId {
        let id = MessageId::new();
        self.ready.push_back(Stored {
            id,
            body,
            receive_count: 0,
        });
        id
    }

    /// Claims whose timeout has passed go back to `ready`, earliest expiry first.
    fn restore_expired(&mut self, now: Instant) {
        let mut expired: Vec<(Instant, MessageId)> = self
            .in_flight
            .iter()
            .filter(|(_, claim)| claim.visible_at <= now)
            .map(|(id, claim)| (claim.visible_at, *id))
            .collect();
        expired.sort();

        for (_, id) in expired {
            if let Some(claim) = self.in_flight.remove(&id) {
                debug!(queue = %self.name, %id, "Visibility timeout expired");
                self.ready.push_back(claim.message);
            }
        }
    }

    fn receive(&mut self, max: usize, settings: &QueueSettings) -> Vec<QueueMessage> {
        let now = Instant::now();
        self.restore_expired(now);

        let mut batch = Vec::with_capacity(max.min(self.ready.len()));
        while batch.len() < max {
            let Some(mut message) = self.ready.pop_front() else {
                break;
            };
            message.receive_count += 1;

            if let Some(limit) = settings.max_receive_count {
                if message.receive_count > limit {
                    warn!(
                        queue = %self.name,
                        id = %message.id,
                        receive_count = message.receive_count,
                        "Moved to dead letters"
                    );
                    self.forget_receipts(message.id);
                    self.dead_letters.push(message);
                    continue;
                }
            }

            let receipt = ReceiptHandle::new();
            self.receipts.insert(receipt, message.id);
            batch.push(QueueMessage {
                id: message.id,
                body: message.body.clone(),
                receipt,
                receive_count: message.receive_count,
            });
            self.in_flight.insert(
                message.id,
                InFlight {
                    message,
                    visible_at: now + settings.visibility_timeout,
                },
            );
        }
        batch
    }

    fn acknowledge(&mut self, receipt: ReceiptHandle) -> bool {
        let Some(id) = self.receipts.remove(&receipt) else {
            return false;
        };
        self.forget_receipts(id);

        if self.in_flight.remove(&id).is_some() {
            return true;
        }
        let before = self.ready.len();
        self.ready.retain(|m| m.id != id);
        before != self.ready.len()
    }

    fn forget_receipts(&mut self, id: MessageId) {
        self.receipts.retain(|_, owner| *owner != id);
    }
}

#[async_trait]
impl ActorEntity for OrderQueue {
    type Id = String;
    /// `Put` creates the queue, or purges it when it already exists.
    type Seed = ();
    type Action = QueueAction;
    type ActionResult = QueueActionResult;
    type Context = QueueSettings;
    type Error = QueueError;

    fn from_seed(name: String, _seed: ()) -> Result<Self, Self::Error> {
        Ok(Self::new(name))
    }

    fn vacant(name: &String) -> Option<Self> {
        Some(Self::new(name.clone()))
    }

    async fn on_put(&mut self, _seed: (), _ctx: &QueueSettings) -> Result<(), Self::Error> {
        *self = Self::new(self.name.clone());
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: QueueAction,
        settings: &QueueSettings,
    ) -> Result<QueueActionResult, Self::Error> {
        match action {
            QueueAction::Enqueue(body) => Ok(QueueActionResult::Enqueue(self.enqueue(body))),
            QueueAction::Receive { max } => {
                if max == 0 || max > MAX_BATCH {
                    return Err(QueueError::InvalidBatchSize {
                        requested: max,
                        max: MAX_BATCH,
                    });
                }
                Ok(QueueActionResult::Receive(self.receive(max, settings)))
            }
            QueueAction::Acknowledge(receipt) => {
                Ok(QueueActionResult::Acknowledge(self.acknowledge(receipt)))
            }
            QueueAction::Depth => Ok(QueueActionResult::Depth(self.depth())),
        }
    }
}
