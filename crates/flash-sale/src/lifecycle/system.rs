use crate::clients::{DispatchQueue, QueueClient, StockClient, StockStore};
use crate::config::{AppConfig, StockBackend};
use crate::queue_actor;
use crate::reservation::ReservationService;
use crate::stock_actor;
use crate::worker::{FulfillmentWorker, OrderSink};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// The running flash-sale system: actors, reservation path and worker.
///
/// # Example
///
/// ```rust
/// use flash_sale::config::AppConfig;
/// use flash_sale::lifecycle::FlashSaleSystem;
/// use flash_sale::reservation::PurchaseOutcome;
/// use flash_sale::model::BuyerId;
/// use flash_sale::worker::LogSink;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), String> {
///     let system = FlashSaleSystem::in_memory(&AppConfig::default(), Arc::new(LogSink));
///     system.reservations.reset(1).await.map_err(|e| e.to_string())?;
///
///     let outcome = system
///         .reservations
///         .attempt_purchase(BuyerId::new("alice"))
///         .await
///         .map_err(|e| e.to_string())?;
///     assert!(matches!(outcome, PurchaseOutcome::Granted(_)));
///
///     system.shutdown().await
/// }
/// ```
pub struct FlashSaleSystem {
    /// The purchase path; share it with the HTTP router.
    pub reservations: Arc<ReservationService>,

    /// The stock backend the reservations run against.
    pub stock: Arc<dyn StockStore>,

    /// Direct handle on the dispatch queue, for depth checks and demos.
    pub queue: QueueClient,

    worker_shutdown: CancellationToken,
    worker_handle: JoinHandle<FulfillmentWorker>,

    /// Task handles for all running actors (used for graceful shutdown)
    handles: Vec<JoinHandle<()>>,
}

impl FlashSaleSystem {
    /// Start with the backend `config` selects, then apply `initial_stock` if set.
    ///
    /// # Errors
    ///
    /// Fails if the stock backend cannot be reached or was not compiled in, or if
    /// the initial stock cannot be written.
    pub async fn start(config: &AppConfig, sink: Arc<dyn OrderSink>) -> Result<Self, String> {
        let system = match &config.stock_backend {
            StockBackend::Memory => Self::in_memory(config, sink),
            StockBackend::Redis { url } => Self::with_redis(config, url, sink).await?,
        };

        if let Some(units) = config.initial_stock {
            system
                .reservations
                .reset(units)
                .await
                .map_err(|e| format!("Failed to set initial stock: {e}"))?;
        }
        Ok(system)
    }

    /// Everything in this process: stock actor, queue actor, worker.
    pub fn in_memory(config: &AppConfig, sink: Arc<dyn OrderSink>) -> Self {
        let (stock_actor, stock_client) = stock_actor::new();
        let stock_handle = tokio::spawn(stock_actor.run(()));
        let stock: Arc<dyn StockStore> = Arc::new(StockClient::new(stock_client));

        Self::assemble(config, stock, vec![stock_handle], sink)
    }

    #[cfg(feature = "redis")]
    async fn with_redis(
        config: &AppConfig,
        url: &str,
        sink: Arc<dyn OrderSink>,
    ) -> Result<Self, String> {
        let store = crate::redis_store::RedisStockStore::connect(url)
            .await
            .map_err(|e| e.to_string())?;
        Ok(Self::assemble(config, Arc::new(store), Vec::new(), sink))
    }

    #[cfg(not(feature = "redis"))]
    async fn with_redis(
        _config: &AppConfig,
        _url: &str,
        _sink: Arc<dyn OrderSink>,
    ) -> Result<Self, String> {
        Err("Redis stock backend requested but the `redis` feature is not enabled".to_string())
    }

    fn assemble(
        config: &AppConfig,
        stock: Arc<dyn StockStore>,
        mut handles: Vec<JoinHandle<()>>,
        sink: Arc<dyn OrderSink>,
    ) -> Self {
        // 1. Queue actor, settings injected as context
        let (queue_actor, queue_client) = queue_actor::new();
        handles.push(tokio::spawn(queue_actor.run(config.queue)));
        let queue = QueueClient::new(queue_client, config.queue_name.clone());

        // 2. Purchase path
        let dispatch: Arc<dyn DispatchQueue> = Arc::new(queue.clone());
        let reservations = Arc::new(ReservationService::new(
            stock.clone(),
            dispatch.clone(),
            config.reservation.clone(),
        ));

        // 3. Worker
        let worker_shutdown = CancellationToken::new();
        let worker = FulfillmentWorker::new(dispatch, sink, config.worker);
        let worker_handle = tokio::spawn(worker.run(worker_shutdown.clone()));

        info!(
            product = %config.reservation.product_key,
            queue = queue.queue_name(),
            "Flash sale system started"
        );

        Self {
            reservations,
            stock,
            queue,
            worker_shutdown,
            worker_handle,
            handles,
        }
    }

    /// Gracefully shuts down the worker, then every actor.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if everything stopped cleanly
    /// - `Err(String)` if a task panicked
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");

        // Step 1: Stop the worker between polls
        self.worker_shutdown.cancel();
        match self.worker_handle.await {
            Ok(worker) => info!(processed = worker.processed().len(), "Worker joined"),
            Err(e) => {
                error!("Worker task failed: {:?}", e);
                return Err(format!("Worker task failed: {:?}", e));
            }
        }

        // Step 2: Close all channels by dropping clients
        drop(self.reservations);
        drop(self.stock);
        drop(self.queue);

        // Step 3: Wait for all actor tasks to complete
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
