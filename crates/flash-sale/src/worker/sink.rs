//! Where processed orders go.

use crate::model::{MessageId, OrderIntent};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SinkError {
    #[error("Order storage unavailable: {0}")]
    Unavailable(String),
}

/// The persistence step of the worker. Called at most once per message id per
/// worker session.
#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn persist(&self, message_id: MessageId, order: &OrderIntent) -> Result<(), SinkError>;
}

/// Stands in for a database insert with a log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl OrderSink for LogSink {
    async fn persist(&self, message_id: MessageId, order: &OrderIntent) -> Result<(), SinkError> {
        info!(
            %message_id,
            user_id = %order.user_id,
            product_id = %order.product_id,
            created_at = %order.timestamp,
            "[DB SAVE] Processing order"
        );
        Ok(())
    }
}

/// Keeps every persisted order in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    orders: Arc<Mutex<Vec<(MessageId, OrderIntent)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> Vec<(MessageId, OrderIntent)> {
        self.orders
            .lock()
            .map(|orders| orders.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.orders.lock().map(|orders| orders.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OrderSink for MemorySink {
    async fn persist(&self, message_id: MessageId, order: &OrderIntent) -> Result<(), SinkError> {
        let mut orders = self
            .orders
            .lock()
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        orders.push((message_id, order.clone()));
        Ok(())
    }
}
