//! # Clients
//!
//! The two seams the core depends on, [`StockStore`] and [`DispatchQueue`], plus their
//! actor-backed implementations. The reservation service and the worker hold
//! `Arc<dyn ...>` trait objects, so tests swap in failing or scripted fakes and the
//! Redis backend slots in without touching either.

pub mod queue_client;
pub mod stock_client;
pub mod traits;

pub use queue_client::QueueClient;
pub use stock_client::StockClient;
pub use traits::{DispatchQueue, StockStore};
