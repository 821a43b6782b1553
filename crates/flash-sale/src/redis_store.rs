//! # Redis Stock Store
//!
//! [`StockStore`] backed by a Redis string per product key, for deployments where
//! several API instances share one counter. Enabled with the `redis` cargo feature.
//!
//! `reserve_one` is a Lua script: Redis runs a script to completion before serving any
//! other command, so the read, the comparison and the `DECR` form one step for every
//! client of the server. A key that was never set is treated as zero.

use crate::clients::StockStore;
use crate::model::ProductKey;
use crate::stock_actor::StockError;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError, Script};
use tracing::{debug, info, instrument};

const RESERVE_ONE: &str = r#"
    local stock = tonumber(redis.call('GET', KEYS[1]) or '0')
    if stock > 0 then
        redis.call('DECR', KEYS[1])
        return 1
    end
    return 0
"#;

#[derive(Clone)]
pub struct RedisStockStore {
    conn_manager: ConnectionManager,
    reserve_script: Script,
}

impl RedisStockStore {
    /// Connect to `redis_url` (e.g. `redis://127.0.0.1:6379`).
    ///
    /// # Errors
    ///
    /// Returns [`StockError::Unavailable`] if the server cannot be reached.
    pub async fn connect(redis_url: &str) -> Result<Self, StockError> {
        let client = Client::open(redis_url).map_err(|e| {
            StockError::Unavailable(format!("Failed to create Redis client: {e}"))
        })?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            StockError::Unavailable(format!("Failed to create Redis connection manager: {e}"))
        })?;

        info!("Connected to Redis stock store");
        Ok(Self {
            conn_manager,
            reserve_script: Script::new(RESERVE_ONE),
        })
    }
}

fn classify(e: RedisError) -> StockError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
    {
        StockError::Unavailable(e.to_string())
    } else {
        StockError::Backend(e.to_string())
    }
}

#[async_trait]
impl StockStore for RedisStockStore {
    #[instrument(skip(self))]
    async fn reserve_one(&self, key: &ProductKey) -> Result<bool, StockError> {
        let mut conn = self.conn_manager.clone();
        let granted: i64 = self
            .reserve_script
            .key(&key.0)
            .invoke_async(&mut conn)
            .await
            .map_err(classify)?;
        debug!(granted, "Reserve script finished");
        Ok(granted == 1)
    }

    #[instrument(skip(self))]
    async fn release_one(&self, key: &ProductKey) -> Result<u64, StockError> {
        let mut conn = self.conn_manager.clone();
        let level: i64 = conn.incr(&key.0, 1).await.map_err(classify)?;
        Ok(level.max(0) as u64)
    }

    #[instrument(skip(self))]
    async fn set_stock(&self, key: &ProductKey, units: u64) -> Result<(), StockError> {
        if units == 0 {
            return Err(StockError::InvalidQuantity(units));
        }
        let mut conn = self.conn_manager.clone();
        let _: () = conn.set(&key.0, units).await.map_err(classify)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_stock(&self, key: &ProductKey) -> Result<u64, StockError> {
        let mut conn = self.conn_manager.clone();
        let level: Option<i64> = conn.get(&key.0).await.map_err(classify)?;
        Ok(level.unwrap_or(0).max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    // Needs a running server: FLASH_SALE_TEST_REDIS_URL=redis://127.0.0.1:6379
    #[tokio::test]
    #[ignore]
    async fn test_reserve_is_atomic_against_redis() {
        let url = std::env::var("FLASH_SALE_TEST_REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let store = Arc::new(RedisStockStore::connect(&url).await.unwrap());
        let key = ProductKey::new(format!("test_stock_{}", uuid::Uuid::new_v4()));

        store.set_stock(&key, 10).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..200 {
            let store = store.clone();
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                store.reserve_one(&key).await.unwrap()
            }));
        }
        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                granted += 1;
            }
        }

        assert_eq!(granted, 10);
        assert_eq!(store.get_stock(&key).await.unwrap(), 0);
        assert_eq!(store.release_one(&key).await.unwrap(), 1);
        assert_eq!(
            store.get_stock(&ProductKey::new(format!("missing_{}", uuid::Uuid::new_v4())))
                .await
                .unwrap(),
            0
        );
    }
}
