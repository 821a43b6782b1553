//! # Stock Client
//!
//! [`StockStore`] over the stock actor.

use super::traits::StockStore;
use crate::model::{ProductKey, StockCounter};
use crate::stock_actor::{StockAction, StockActionResult, StockError};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct StockClient {
    inner: ResourceClient<StockCounter>,
}

impl StockClient {
    pub fn new(inner: ResourceClient<StockCounter>) -> Self {
        Self { inner }
    }

    async fn act(
        &self,
        key: &ProductKey,
        action: StockAction,
    ) -> Result<StockActionResult, StockError> {
        self.inner
            .perform_action(key.clone(), action)
            .await
            .map_err(Self::map_error)
    }
}

#[async_trait]
impl ActorClient<StockCounter> for StockClient {
    type Error = StockError;

    fn inner(&self) -> &ResourceClient<StockCounter> {
        &self.inner
    }

    /// Entity errors come back as the `StockError` the entity raised.
    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::EntityError(inner) => match inner.downcast::<StockError>() {
                Ok(stock) => *stock,
                Err(other) => StockError::Backend(other.to_string()),
            },
            other => StockError::Unavailable(other.to_string()),
        }
    }
}

fn unexpected(result: StockActionResult) -> StockError {
    StockError::Backend(format!("Unexpected stock action result: {:?}", result))
}

#[async_trait]
impl StockStore for StockClient {
    #[instrument(skip(self))]
    async fn reserve_one(&self, key: &ProductKey) -> Result<bool, StockError> {
        match self.act(key, StockAction::ReserveOne).await? {
            StockActionResult::ReserveOne(granted) => Ok(granted),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    async fn release_one(&self, key: &ProductKey) -> Result<u64, StockError> {
        match self.act(key, StockAction::ReleaseOne).await? {
            StockActionResult::ReleaseOne(level) => Ok(level),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    async fn set_stock(&self, key: &ProductKey, units: u64) -> Result<(), StockError> {
        if units == 0 {
            return Err(StockError::InvalidQuantity(units));
        }
        debug!("Setting stock");
        self.inner
            .put(key.clone(), units)
            .await
            .map(|_| ())
            .map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    async fn get_stock(&self, key: &ProductKey) -> Result<u64, StockError> {
        Ok(self
            .get(key.clone())
            .await?
            .map(|counter| counter.units)
            .unwrap_or(0))
    }
}
