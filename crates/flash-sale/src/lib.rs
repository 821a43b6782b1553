//! # Flash Sale
//!
//! A flash-sale "buy" flow: many buyers race for a few units, each winner's order is
//! queued, and a worker persists every order exactly once in effect.
//!
//! ## Components
//!
//! - **[stock_actor]** / **redis_store** (feature `redis`): the Atomic Stock Store. `reserve_one` is a
//!   single indivisible decrement-if-positive, so N concurrent buyers against K units
//!   get exactly K grants.
//! - **[queue_actor]**: the Dispatch Queue. At-least-once delivery with a visibility
//!   timeout and a dead-letter redrive.
//! - **[clients]**: the [`StockStore`](clients::StockStore) and
//!   [`DispatchQueue`](clients::DispatchQueue) seams and their actor-backed clients.
//! - **[reservation]**: one purchase attempt, Granted / SoldOut / transient failure,
//!   with the unit given back when the order cannot be queued.
//! - **[worker]**: the Fulfillment Worker loop, deduplicating redeliveries by message id.
//! - **[http]**: `POST /buy`, `GET /stock`, `POST /reset-stock/{count}`.
//! - **[config]** and **[lifecycle]**: environment settings, wiring and shutdown.
//!
//! ## Data flow
//!
//! ```text
//! POST /buy ─▶ ReservationService ─▶ reserve_one ─▶ enqueue ─▶ FulfillmentWorker ─▶ acknowledge
//! ```
//!
//! ## Testing
//!
//! See [`actor_framework::mock`] for utilities to test clients without spawning actors,
//! and `tests/` for the contention and redelivery scenarios.

pub mod clients;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod queue_actor;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod reservation;
pub mod stock_actor;
pub mod worker;
