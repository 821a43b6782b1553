//! # System Lifecycle
//!
//! Starting, wiring and stopping the flash-sale system.
//!
//! [`FlashSaleSystem`] creates the actors first and injects their settings through
//! `run(context)` afterwards, then builds the [`ReservationService`](crate::reservation::ReservationService)
//! and the [`FulfillmentWorker`](crate::worker::FulfillmentWorker) on top of their clients.
//!
//! ## Shutdown order
//!
//! 1. Cancel the worker and wait for it to finish the batch it is settling.
//! 2. Drop every client, which closes the actors' channels.
//! 3. Await the actor tasks; each drains what is already queued, then exits.
//!
//! Anything still holding an `Arc<ReservationService>` (a running HTTP server, say)
//! keeps the stock actor alive, so stop the server before calling
//! [`FlashSaleSystem::shutdown`].
//!
//! ## Observability
//!
//! [`setup_tracing`] installs a compact `tracing` subscriber filtered by `RUST_LOG`.
//!
//! ```bash
//! RUST_LOG=info cargo run -p flash-sale     # One line per order
//! RUST_LOG=debug cargo run -p flash-sale    # Every actor request
//! ```

pub mod system;
pub mod tracing;

pub use self::system::*;
pub use self::tracing::*;
