//! # Queue Actor
//!
//! The in-process Dispatch Queue. An [`OrderQueue`] holds messages for one queue name
//! and gives them the delivery contract the worker relies on:
//!
//! - **At-least-once**: a message leaves the queue only when it is acknowledged.
//! - **Visibility timeout**: a received message is hidden for
//!   [`QueueSettings::visibility_timeout`], then becomes receivable again.
//! - **Redrive**: a message received more than [`QueueSettings::max_receive_count`] times
//!   is parked on a dead-letter list instead of being delivered again.
//!
//! Ordering across messages is best effort only.
//!
//! ## Structure
//!
//! - [`entity`] - [`OrderQueue`] and its [`ActorEntity`](actor_framework::ActorEntity) implementation
//! - [`error`] - [`QueueError`]
//! - [`actions`] - [`QueueAction`] and [`QueueActionResult`]
//! - [`new()`] - Factory function that creates the actor and client

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use entity::OrderQueue;
pub use error::*;

use actor_framework::{ResourceActor, ResourceClient};
use std::time::Duration;

/// Largest batch a single receive may claim.
pub const MAX_BATCH: usize = 10;

/// Longest a single long-poll may wait for messages.
pub const MAX_WAIT: Duration = Duration::from_secs(20);

/// Delivery settings, injected into the actor as its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSettings {
    pub visibility_timeout: Duration,
    /// `None` disables the dead-letter redrive.
    pub max_receive_count: Option<u32>,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            visibility_timeout: Duration::from_secs(30),
            max_receive_count: Some(5),
        }
    }
}

/// Creates a new queue actor and its client.
pub fn new() -> (ResourceActor<OrderQueue>, ResourceClient<OrderQueue>) {
    ResourceActor::new(256)
}
