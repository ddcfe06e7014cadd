//! Infrastructure layer: stock stores, Redis wiring, config, and the
//! reservation engine that fronts them.

pub mod config;
pub mod engine;
pub mod stock_store;


pub use config::{ConfigError, RedisConfig};
pub use engine::{ReservationEngine, ReservationError};
pub use stock_store::{AsyncStockStore, InMemoryStockStore, StockStore, StockStoreError};

#[cfg(feature = "redis")]
pub use stock_store::RedisStockStore;
