//! Pure data types shared by the actors, the reservation path and the worker.
//!
//! Nothing here talks to a channel or a socket. [`StockCounter`] and
//! [`OrderQueue`](crate::queue_actor::OrderQueue) implement
//! [`ActorEntity`](actor_framework::ActorEntity) in their own actor modules.

pub mod message;
pub mod order;
pub mod stock;

pub use message::*;
pub use order::*;
pub use stock::*;
