//! Entity trait implementation for [`StockCounter`].

use super::actions::{StockAction, StockActionResult};
use super::error::StockError;
use crate::model::{ProductKey, StockCounter};
use actor_framework::ActorEntity;
use async_trait::async_trait;
use tracing::debug;

#[async_trait]
impl ActorEntity for StockCounter {
    type Id = ProductKey;
    type Seed = u64;
    type Action = StockAction;
    type ActionResult = StockActionResult;
    type Context = ();
    type Error = StockError;

    fn from_seed(key: ProductKey, units: u64) -> Result<Self, Self::Error> {
        if units == 0 {
            return Err(StockError::InvalidQuantity(units));
        }
        Ok(Self::new(key, units))
    }

    /// A key that was never set reads as zero units.
    fn vacant(key: &ProductKey) -> Option<Self> {
        Some(Self::empty(key.clone()))
    }

    async fn on_put(&mut self, units: u64, _ctx: &Self::Context) -> Result<(), Self::Error> {
        if units == 0 {
            return Err(StockError::InvalidQuantity(units));
        }
        self.units = units;
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: StockAction,
        _ctx: &Self::Context,
    ) -> Result<StockActionResult, Self::Error> {
        match action {
            StockAction::ReserveOne => {
                if self.units > 0 {
                    self.units -= 1;
                    debug!(key = %self.key, remaining = self.units, "Unit reserved");
                    Ok(StockActionResult::ReserveOne(true))
                } else {
                    Ok(StockActionResult::ReserveOne(false))
                }
            }
            StockAction::ReleaseOne => {
                self.units = self.units.saturating_add(1);
                debug!(key = %self.key, remaining = self.units, "Unit released");
                Ok(StockActionResult::ReleaseOne(self.units))
            }
            StockAction::Level => Ok(StockActionResult::Level(self.units)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reserve_stops_at_zero() {
        let mut counter = StockCounter::new(ProductKey::default(), 2);

        for expected in [true, true, false, false] {
            let result = counter
                .handle_action(StockAction::ReserveOne, &())
                .await
                .unwrap();
            assert_eq!(result, StockActionResult::ReserveOne(expected));
        }
        assert_eq!(counter.units, 0);
    }

    #[tokio::test]
    async fn test_release_restores_a_unit() {
        let mut counter = StockCounter::empty(ProductKey::default());
        let result = counter
            .handle_action(StockAction::ReleaseOne, &())
            .await
            .unwrap();
        assert_eq!(result, StockActionResult::ReleaseOne(1));
    }

    #[tokio::test]
    async fn test_zero_is_not_a_valid_stock_count() {
        assert_eq!(
            StockCounter::from_seed(ProductKey::default(), 0),
            Err(StockError::InvalidQuantity(0))
        );

        let mut counter = StockCounter::new(ProductKey::default(), 3);
        assert!(counter.on_put(0, &()).await.is_err());
        assert_eq!(counter.units, 3);
    }
}
