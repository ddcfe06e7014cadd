//! Counter store boundary.
//!
//! A stock store owns the available/reserved counters and executes the
//! check-and-transfer as one atomic unit. The engine never reads and then
//! writes in separate calls; it hands the whole request to the store.

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis;
#[cfg(feature = "redis")]
mod script;
pub mod r#trait;

pub use in_memory::InMemoryStockStore;
pub use r#trait::{AsyncStockStore, StockStore, StockStoreError};

#[cfg(feature = "redis")]
pub use self::redis::RedisStockStore;
