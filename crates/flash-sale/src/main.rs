use flash_sale::config::AppConfig;
use flash_sale::http;
use flash_sale::lifecycle::{setup_tracing, FlashSaleSystem};
use flash_sale::worker::LogSink;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), String> {
    // A missing .env file is fine; real environment variables still apply
    let _ = dotenvy::dotenv();
    setup_tracing();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Refusing to start");
            return Err(e.to_string());
        }
    };

    let system = FlashSaleSystem::start(&config, Arc::new(LogSink)).await?;

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| format!("Failed to bind {}: {e}", config.bind))?;
    info!(address = %config.bind, "Server running");

    let served = axum::serve(listener, http::router(system.reservations.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(e) = &served {
        error!(error = %e, "Server failed");
    }

    system.shutdown().await?;
    served.map_err(|e| e.to_string())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
