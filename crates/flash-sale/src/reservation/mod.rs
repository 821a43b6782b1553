//! # Reservation Service
//!
//! One purchase attempt: take a unit from the [`StockStore`], then hand an
//! [`OrderIntent`] to the [`DispatchQueue`].
//!
//! ```text
//! reserve_one ──false──▶ SoldOut            (nothing changed, nothing queued)
//!      │
//!     true
//!      ▼
//!   enqueue ──ok──▶ Granted(message id)
//!      │  └──no answer in time──▶ HandoffPending (released later only if it fails)
//!    error
//!      ▼
//!  release_one ──▶ Handoff { compensated }
//! ```
//!
//! Every store and queue call is bounded, so an attempt never hangs on a stalled
//! backend. A call that mutates state runs on its own task and only the wait on it is
//! cut short: a `reserve_one` that answers after the deadline is settled in the
//! background (a late grant is released again), and an `enqueue` that answers late
//! either stands or, if it fails, has its unit released. When the hand-off fails
//! after a grant the unit is given back with `release_one`; a release that fails too
//! is logged at `error` with the buyer so the lost unit can be reconciled.

pub mod error;

pub use error::*;

use crate::clients::{DispatchQueue, StockStore};
use crate::model::{BuyerId, MessageId, OrderIntent, ProductId, ProductKey};
use crate::queue_actor::QueueError;
use crate::stock_actor::StockError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

/// Result of a purchase attempt that reached a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// A unit was taken and the order is on its way to the worker.
    Granted(MessageId),
    SoldOut,
}

#[derive(Debug, Clone)]
pub struct ReservationSettings {
    pub product_key: ProductKey,
    pub product_id: ProductId,
    pub store_timeout: Duration,
    pub queue_timeout: Duration,
}

impl Default for ReservationSettings {
    fn default() -> Self {
        Self {
            product_key: ProductKey::default(),
            product_id: ProductId::default(),
            store_timeout: Duration::from_secs(2),
            queue_timeout: Duration::from_secs(5),
        }
    }
}

/// A backend call on its own task, after waiting for it at most once.
enum Raced<T, E> {
    Finished(Result<T, E>),
    Crashed(JoinError),
    /// Still running; the handle lets the caller settle it later.
    Late(JoinHandle<Result<T, E>>),
}

async fn race<T, E>(limit: Duration, mut call: JoinHandle<Result<T, E>>) -> Raced<T, E> {
    match timeout(limit, &mut call).await {
        Ok(Ok(result)) => Raced::Finished(result),
        Ok(Err(e)) => Raced::Crashed(e),
        Err(_) => Raced::Late(call),
    }
}

pub struct ReservationService {
    store: Arc<dyn StockStore>,
    queue: Arc<dyn DispatchQueue>,
    settings: ReservationSettings,
}

impl ReservationService {
    pub fn new(
        store: Arc<dyn StockStore>,
        queue: Arc<dyn DispatchQueue>,
        settings: ReservationSettings,
    ) -> Self {
        Self {
            store,
            queue,
            settings,
        }
    }

    pub fn product_key(&self) -> &ProductKey {
        &self.settings.product_key
    }

    /// Try to buy one unit for `buyer`.
    #[instrument(skip(self), fields(product = %self.settings.product_key))]
    pub async fn attempt_purchase(
        &self,
        buyer: BuyerId,
    ) -> Result<PurchaseOutcome, ReservationError> {
        let store = Arc::clone(&self.store);
        let key = self.settings.product_key.clone();
        let reserve = tokio::spawn(async move { store.reserve_one(&key).await });

        let granted = match race(self.settings.store_timeout, reserve).await {
            Raced::Finished(result) => result?,
            Raced::Crashed(e) => {
                return Err(ReservationError::StoreUnavailable(format!(
                    "Reserve task failed: {e}"
                )))
            }
            Raced::Late(reserve) => {
                self.settle_late_reserve(reserve, buyer);
                return Err(ReservationError::StoreTimeout(self.settings.store_timeout));
            }
        };
        if !granted {
            info!("Sold out");
            return Ok(PurchaseOutcome::SoldOut);
        }

        let order = OrderIntent::new(buyer, self.settings.product_id.clone());
        let body = match order.to_body() {
            Ok(body) => body,
            Err(e) => {
                let reason = format!("Failed to serialise order: {e}");
                return Err(self.compensate(&order, reason).await);
            }
        };

        let queue = Arc::clone(&self.queue);
        let enqueue = tokio::spawn(async move { queue.enqueue(body).await });
        match race(self.settings.queue_timeout, enqueue).await {
            Raced::Finished(Ok(id)) => {
                info!(order_id = %id, user_id = %order.user_id, "Order queued");
                Ok(PurchaseOutcome::Granted(id))
            }
            Raced::Finished(Err(e)) => Err(self.compensate(&order, e.to_string()).await),
            Raced::Crashed(e) => {
                let reason = format!("Enqueue task failed: {e}");
                Err(self.compensate(&order, reason).await)
            }
            Raced::Late(enqueue) => {
                warn!(user_id = %order.user_id, "Enqueue still pending");
                self.settle_late_enqueue(enqueue, order.user_id);
                Err(ReservationError::HandoffPending(self.settings.queue_timeout))
            }
        }
    }

    /// Units left. A counter that was never set reports 0.
    #[instrument(skip(self), fields(product = %self.settings.product_key))]
    pub async fn remaining(&self) -> Result<u64, ReservationError> {
        self.bounded(self.store.get_stock(&self.settings.product_key))
            .await
    }

    /// Set the counter to `units` (at least 1), whatever it held before.
    #[instrument(skip(self), fields(product = %self.settings.product_key))]
    pub async fn reset(&self, units: u64) -> Result<(), ReservationError> {
        if units == 0 {
            return Err(ReservationError::InvalidQuantity(units));
        }
        self.bounded(self.store.set_stock(&self.settings.product_key, units))
            .await?;
        info!(units, "Stock reset");
        Ok(())
    }

    /// Only for calls that are safe to abandon: reads and overwrites.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StockError>>,
    ) -> Result<T, ReservationError> {
        match timeout(self.settings.store_timeout, call).await {
            Ok(result) => result.map_err(ReservationError::from),
            Err(_) => Err(ReservationError::StoreTimeout(self.settings.store_timeout)),
        }
    }

    fn spawn_release(&self) -> JoinHandle<Result<u64, StockError>> {
        let store = Arc::clone(&self.store);
        let key = self.settings.product_key.clone();
        tokio::spawn(async move { store.release_one(&key).await })
    }

    /// The buyer already saw `StoreTimeout`, so a grant that shows up now is put back.
    fn settle_late_reserve(&self, reserve: JoinHandle<Result<bool, StockError>>, buyer: BuyerId) {
        let store = Arc::clone(&self.store);
        let key = self.settings.product_key.clone();
        tokio::spawn(async move {
            match reserve.await {
                Ok(Ok(true)) => {
                    let released = store.release_one(&key).await;
                    log_release("Late reservation", released, &buyer);
                }
                Ok(Ok(false)) | Ok(Err(_)) => {}
                Err(e) => error!(error = %e, user_id = %buyer, "Reserve task failed after timeout"),
            }
        });
    }

    /// An enqueue that lands late stands; one that fails late gives its unit back.
    fn settle_late_enqueue(
        &self,
        enqueue: JoinHandle<Result<MessageId, QueueError>>,
        buyer: BuyerId,
    ) {
        let store = Arc::clone(&self.store);
        let key = self.settings.product_key.clone();
        tokio::spawn(async move {
            let reason = match enqueue.await {
                Ok(Ok(id)) => {
                    info!(order_id = %id, user_id = %buyer, "Order queued after the deadline");
                    return;
                }
                Ok(Err(e)) => e.to_string(),
                Err(e) => format!("Enqueue task failed: {e}"),
            };
            warn!(%reason, user_id = %buyer, "Late enqueue failed");
            let released = store.release_one(&key).await;
            log_release("Late hand-off", released, &buyer);
        });
    }

    async fn compensate(&self, order: &OrderIntent, reason: String) -> ReservationError {
        let compensated = match race(self.settings.store_timeout, self.spawn_release()).await {
            Raced::Finished(Ok(level)) => {
                warn!(%reason, level, user_id = %order.user_id, "Hand-off failed, unit released");
                true
            }
            Raced::Finished(Err(e)) => {
                error!(
                    %reason,
                    release_error = %e,
                    user_id = %order.user_id,
                    "Hand-off failed and unit could not be released"
                );
                false
            }
            Raced::Crashed(e) => {
                error!(%reason, release_error = %e, user_id = %order.user_id, "Release task failed");
                false
            }
            Raced::Late(release) => {
                warn!(%reason, user_id = %order.user_id, "Release still pending");
                let buyer = order.user_id.clone();
                tokio::spawn(async move {
                    match release.await {
                        Ok(result) => log_release("Late release", result, &buyer),
                        Err(e) => error!(error = %e, user_id = %buyer, "Release task failed"),
                    }
                });
                false
            }
        };
        ReservationError::Handoff {
            reason,
            compensated,
        }
    }
}

fn log_release(what: &str, released: Result<u64, StockError>, buyer: &BuyerId) {
    match released {
        Ok(level) => warn!(level, user_id = %buyer, "{what}: unit released"),
        Err(e) => error!(error = %e, user_id = %buyer, "{what}: unit could not be released"),
    }
}
