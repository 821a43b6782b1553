//! # Stock Actor
//!
//! The in-process Atomic Stock Store: one [`StockCounter`] per [`ProductKey`], owned by a
//! [`ResourceActor`] task.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](actor_framework::ActorEntity) implementation for [`StockCounter`]
//! - [`error`] - [`StockError`], shared with every other stock backend
//! - [`actions`] - [`StockAction`] and [`StockActionResult`]
//! - [`new()`] - Factory function that creates the actor and client
//!
//! ## Why an actor
//!
//! `ReserveOne` reads the level and decrements it inside a single `handle_action` call.
//! The actor drains its channel one request at a time, so no other request can observe
//! the counter between that read and that write. For N concurrent callers against K
//! units exactly K are granted.
//!
//! ```rust
//! use flash_sale::clients::{StockClient, StockStore};
//! use flash_sale::model::ProductKey;
//! use flash_sale::stock_actor;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (actor, client) = stock_actor::new();
//!     tokio::spawn(actor.run(()));
//!     let stock = StockClient::new(client);
//!
//!     let key = ProductKey::default();
//!     stock.set_stock(&key, 1).await?;
//!     assert!(stock.reserve_one(&key).await?);
//!     assert!(!stock.reserve_one(&key).await?);
//!     assert_eq!(stock.get_stock(&key).await?, 0);
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::model::StockCounter;
use actor_framework::{ResourceActor, ResourceClient};

/// Creates a new stock actor and its client.
pub fn new() -> (ResourceActor<StockCounter>, ResourceClient<StockCounter>) {
    ResourceActor::new(256)
}
