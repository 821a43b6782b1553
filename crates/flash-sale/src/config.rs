//! # Configuration
//!
//! Everything is read from `FLASH_SALE_*` environment variables (a `.env` file is loaded
//! first by the binary). Every setting has a default except the Redis URL, which is
//! required once the Redis backend is selected. Any error here is fatal: the process
//! must not start serving with a half-understood configuration.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `FLASH_SALE_BIND` | `127.0.0.1:3003` |
//! | `FLASH_SALE_STOCK_BACKEND` | `memory` (or `redis`) |
//! | `FLASH_SALE_REDIS_URL` | required for `redis` |
//! | `FLASH_SALE_PRODUCT_KEY` | `iphone_stock` |
//! | `FLASH_SALE_PRODUCT_ID` | `iphone_16` |
//! | `FLASH_SALE_INITIAL_STOCK` | unset (counter starts at 0) |
//! | `FLASH_SALE_QUEUE_NAME` | `orders` |
//! | `FLASH_SALE_VISIBILITY_TIMEOUT_SECS` | `30` |
//! | `FLASH_SALE_MAX_RECEIVE_COUNT` | `5` (`0` disables dead-lettering) |
//! | `FLASH_SALE_STORE_TIMEOUT_MS` | `2000` |
//! | `FLASH_SALE_QUEUE_TIMEOUT_MS` | `5000` |
//! | `FLASH_SALE_WORKER_BATCH_SIZE` | `10` (1..=10) |
//! | `FLASH_SALE_WORKER_WAIT_SECS` | `20` (at most 20) |
//! | `FLASH_SALE_WORKER_PROCESS_TIMEOUT_SECS` | `10` |
//! | `FLASH_SALE_WORKER_RETRY_MS` | `1000` |

use crate::model::{ProductId, ProductKey};
use crate::queue_actor::{QueueSettings, MAX_BATCH, MAX_WAIT};
use crate::reservation::ReservationSettings;
use crate::worker::WorkerConfig;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Startup configuration problems. Always fatal.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockBackend {
    /// The stock actor, in this process.
    Memory,
    Redis { url: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub stock_backend: StockBackend,
    pub initial_stock: Option<u64>,
    pub queue_name: String,
    pub queue: QueueSettings,
    pub reservation: ReservationSettings,
    pub worker: WorkerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3003)),
            stock_backend: StockBackend::Memory,
            initial_stock: None,
            queue_name: "orders".to_string(),
            queue: QueueSettings::default(),
            reservation: ReservationSettings::default(),
            worker: WorkerConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; `lookup` returns `None` for unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let defaults = Self::default();

        let stock_backend = match vars.text("FLASH_SALE_STOCK_BACKEND") {
            None => StockBackend::Memory,
            Some(kind) => match kind.to_ascii_lowercase().as_str() {
                "memory" => StockBackend::Memory,
                "redis" => StockBackend::Redis {
                    url: vars
                        .text("FLASH_SALE_REDIS_URL")
                        .ok_or(ConfigError::Missing("FLASH_SALE_REDIS_URL"))?,
                },
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "FLASH_SALE_STOCK_BACKEND",
                        value: kind,
                        reason: "expected memory or redis".to_string(),
                    })
                }
            },
        };

        let initial_stock = match vars.parse::<u64>("FLASH_SALE_INITIAL_STOCK")? {
            Some(0) => {
                return Err(ConfigError::Invalid {
                    var: "FLASH_SALE_INITIAL_STOCK",
                    value: "0".to_string(),
                    reason: "must be at least 1".to_string(),
                })
            }
            other => other,
        };

        let max_receive_count = match vars.parse::<u32>("FLASH_SALE_MAX_RECEIVE_COUNT")? {
            Some(0) => None,
            Some(limit) => Some(limit),
            None => defaults.queue.max_receive_count,
        };

        let batch_size = vars
            .parse::<usize>("FLASH_SALE_WORKER_BATCH_SIZE")?
            .unwrap_or(defaults.worker.batch_size);
        if !(1..=MAX_BATCH).contains(&batch_size) {
            return Err(ConfigError::Invalid {
                var: "FLASH_SALE_WORKER_BATCH_SIZE",
                value: batch_size.to_string(),
                reason: format!("must be between 1 and {MAX_BATCH}"),
            });
        }

        let wait = vars
            .secs("FLASH_SALE_WORKER_WAIT_SECS")?
            .unwrap_or(defaults.worker.wait);
        if wait > MAX_WAIT {
            return Err(ConfigError::Invalid {
                var: "FLASH_SALE_WORKER_WAIT_SECS",
                value: wait.as_secs().to_string(),
                reason: format!("must be at most {}", MAX_WAIT.as_secs()),
            });
        }

        Ok(Self {
            bind: vars.parse("FLASH_SALE_BIND")?.unwrap_or(defaults.bind),
            stock_backend,
            initial_stock,
            queue_name: vars
                .text("FLASH_SALE_QUEUE_NAME")
                .unwrap_or(defaults.queue_name),
            queue: QueueSettings {
                visibility_timeout: vars
                    .positive("FLASH_SALE_VISIBILITY_TIMEOUT_SECS", Duration::from_secs)?
                    .unwrap_or(defaults.queue.visibility_timeout),
                max_receive_count,
            },
            reservation: ReservationSettings {
                product_key: vars
                    .text("FLASH_SALE_PRODUCT_KEY")
                    .map(ProductKey::new)
                    .unwrap_or(defaults.reservation.product_key),
                product_id: vars
                    .text("FLASH_SALE_PRODUCT_ID")
                    .map(ProductId::new)
                    .unwrap_or(defaults.reservation.product_id),
                store_timeout: vars
                    .positive("FLASH_SALE_STORE_TIMEOUT_MS", Duration::from_millis)?
                    .unwrap_or(defaults.reservation.store_timeout),
                queue_timeout: vars
                    .positive("FLASH_SALE_QUEUE_TIMEOUT_MS", Duration::from_millis)?
                    .unwrap_or(defaults.reservation.queue_timeout),
            },
            worker: WorkerConfig {
                batch_size,
                wait,
                process_timeout: vars
                    .positive("FLASH_SALE_WORKER_PROCESS_TIMEOUT_SECS", Duration::from_secs)?
                    .unwrap_or(defaults.worker.process_timeout),
                retry_interval: vars
                    .positive("FLASH_SALE_WORKER_RETRY_MS", Duration::from_millis)?
                    .unwrap_or(defaults.worker.retry_interval),
            },
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Unset and blank are the same thing.
    fn text(&self, var: &str) -> Option<String> {
        (self.0)(var)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn parse<T>(&self, var: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.text(var)
            .map(|value| {
                value.parse::<T>().map_err(|e| ConfigError::Invalid {
                    var,
                    value: value.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    fn secs(&self, var: &'static str) -> Result<Option<Duration>, ConfigError> {
        Ok(self.parse::<u64>(var)?.map(Duration::from_secs))
    }

    /// A duration where 0 would stall or spin the service.
    fn positive(
        &self,
        var: &'static str,
        unit: fn(u64) -> Duration,
    ) -> Result<Option<Duration>, ConfigError> {
        match self.parse::<u64>(var)? {
            Some(0) => Err(ConfigError::Invalid {
                var,
                value: "0".to_string(),
                reason: "must be greater than 0".to_string(),
            }),
            other => Ok(other.map(unit)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind, SocketAddr::from(([127, 0, 0, 1], 3003)));
        assert_eq!(config.stock_backend, StockBackend::Memory);
        assert_eq!(config.reservation.product_key, ProductKey::new("iphone_stock"));
        assert_eq!(config.worker.batch_size, 10);
        assert_eq!(config.worker.wait, Duration::from_secs(20));
        assert_eq!(config.queue.max_receive_count, Some(5));
        assert_eq!(config.initial_stock, None);
    }

    #[test]
    fn test_redis_requires_url() {
        assert_eq!(
            load(&[("FLASH_SALE_STOCK_BACKEND", "redis")]).unwrap_err(),
            ConfigError::Missing("FLASH_SALE_REDIS_URL")
        );

        let config = load(&[
            ("FLASH_SALE_STOCK_BACKEND", "Redis"),
            ("FLASH_SALE_REDIS_URL", "redis://cache:6379"),
        ])
        .unwrap();
        assert_eq!(
            config.stock_backend,
            StockBackend::Redis {
                url: "redis://cache:6379".to_string()
            }
        );
    }

    #[test]
    fn test_out_of_range_worker_settings_are_fatal() {
        assert!(matches!(
            load(&[("FLASH_SALE_WORKER_BATCH_SIZE", "11")]),
            Err(ConfigError::Invalid { var: "FLASH_SALE_WORKER_BATCH_SIZE", .. })
        ));
        assert!(matches!(
            load(&[("FLASH_SALE_WORKER_WAIT_SECS", "21")]),
            Err(ConfigError::Invalid { var: "FLASH_SALE_WORKER_WAIT_SECS", .. })
        ));
        assert!(matches!(
            load(&[("FLASH_SALE_STORE_TIMEOUT_MS", "soon")]),
            Err(ConfigError::Invalid { var: "FLASH_SALE_STORE_TIMEOUT_MS", .. })
        ));
        assert!(matches!(
            load(&[("FLASH_SALE_STOCK_BACKEND", "postgres")]),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_zero_durations_are_fatal() {
        for var in [
            "FLASH_SALE_STORE_TIMEOUT_MS",
            "FLASH_SALE_QUEUE_TIMEOUT_MS",
            "FLASH_SALE_WORKER_RETRY_MS",
            "FLASH_SALE_WORKER_PROCESS_TIMEOUT_SECS",
            "FLASH_SALE_VISIBILITY_TIMEOUT_SECS",
        ] {
            match load(&[(var, "0")]) {
                Err(ConfigError::Invalid { var: rejected, .. }) => assert_eq!(rejected, var),
                other => panic!("Expected {var}=0 to be rejected, got {:?}", other.map(|_| ())),
            }
        }

        let config = load(&[("FLASH_SALE_WORKER_WAIT_SECS", "0")]).unwrap();
        assert_eq!(config.worker.wait, Duration::ZERO);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("FLASH_SALE_BIND", "0.0.0.0:8080"),
            ("FLASH_SALE_INITIAL_STOCK", "10"),
            ("FLASH_SALE_MAX_RECEIVE_COUNT", "0"),
            ("FLASH_SALE_WORKER_BATCH_SIZE", "5"),
            ("FLASH_SALE_PRODUCT_ID", "pixel_9"),
        ])
        .unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.initial_stock, Some(10));
        assert_eq!(config.queue.max_receive_count, None);
        assert_eq!(config.worker.batch_size, 5);
        assert_eq!(config.reservation.product_id, ProductId::new("pixel_9"));
    }
}
