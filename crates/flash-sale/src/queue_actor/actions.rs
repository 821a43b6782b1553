//! Custom actions for the queue actor.

use crate::model::{MessageId, QueueMessage, ReceiptHandle};

#[derive(Debug, Clone)]
pub enum QueueAction {
    /// Append a serialised body; the queue assigns its identity.
    Enqueue(String),
    /// Claim up to `max` visible messages, each with a fresh receipt.
    Receive { max: usize },
    /// Permanently remove the message a receipt was issued for.
    Acknowledge(ReceiptHandle),
    Depth,
}

/// Message counts by state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueDepth {
    pub ready: usize,
    pub in_flight: usize,
    pub dead_lettered: usize,
}

impl QueueDepth {
    /// Messages that will still be delivered.
    pub fn live(&self) -> usize {
        self.ready + self.in_flight
    }
}

/// Results from QueueActions - variants match 1:1 with QueueAction
#[derive(Debug, Clone)]
pub enum QueueActionResult {
    Enqueue(MessageId),
    Receive(Vec<QueueMessage>),
    /// `false` when the receipt matched no live message.
    Acknowledge(bool),
    Depth(QueueDepth),
}
