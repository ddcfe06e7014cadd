//! Redis-backed counter store.
//!
//! The check-and-transfer runs as a server-evaluated Lua script, so Redis
//! serializes it against every other command. The script handle is built
//! once per store; `invoke` sends EVALSHA and falls back to loading the
//! script when the server does not know its hash yet.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use stockres_inventory::{ReservationOutcome, ReservationRequest, StockKeys, StockLevels};

use super::r#trait::{AsyncStockStore, StockStore, StockStoreError};
use super::script::RESERVE_STOCK;
use crate::config::RedisConfig;

pub struct RedisStockStore {
    client: redis::Client,
    script: redis::Script,
    connect_timeout: Duration,
    io_timeout: Duration,
    manager: OnceCell<redis::aio::ConnectionManager>,
}

impl fmt::Debug for RedisStockStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStockStore")
            .field("addr", &self.client.get_connection_info().addr)
            .field("script_hash", &self.script.get_hash())
            .field("connect_timeout", &self.connect_timeout)
            .field("io_timeout", &self.io_timeout)
            .finish()
    }
}

impl RedisStockStore {
    /// Build a store from connection parameters. Does not connect yet.
    pub fn new(config: &RedisConfig) -> Result<Self, StockStoreError> {
        let client = redis::Client::open(config.connection_info())
            .map_err(|e| StockStoreError::Connection(e.to_string()))?;

        Ok(Self::with_client(client, config.connect_timeout, config.io_timeout))
    }

    /// Build a store from a URL (e.g. `redis://localhost:6379/15`) with the
    /// default connect and I/O timeouts of [`RedisConfig`].
    pub fn from_url(redis_url: impl AsRef<str>) -> Result<Self, StockStoreError> {
        Self::from_url_with(redis_url, &RedisConfig::default())
    }

    /// Build a store from a URL, taking only the timeouts from `config`.
    /// Address, database and credentials come from the URL.
    pub fn from_url_with(
        redis_url: impl AsRef<str>,
        config: &RedisConfig,
    ) -> Result<Self, StockStoreError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| StockStoreError::Connection(e.to_string()))?;

        Ok(Self::with_client(client, config.connect_timeout, config.io_timeout))
    }

    fn with_client(client: redis::Client, connect_timeout: Duration, io_timeout: Duration) -> Self {
        Self {
            client,
            script: redis::Script::new(RESERVE_STOCK),
            connect_timeout,
            io_timeout,
            manager: OnceCell::new(),
        }
    }

    fn connection(&self) -> Result<redis::Connection, StockStoreError> {
        let conn = self
            .client
            .get_connection_with_timeout(self.connect_timeout)
            .map_err(map_redis_error)?;
        conn.set_read_timeout(Some(self.io_timeout))
            .map_err(map_redis_error)?;
        conn.set_write_timeout(Some(self.io_timeout))
            .map_err(map_redis_error)?;
        Ok(conn)
    }

    async fn async_connection(&self) -> Result<redis::aio::ConnectionManager, StockStoreError> {
        let manager = self
            .manager
            .get_or_try_init(|| async {
                let connect = redis::aio::ConnectionManager::new(self.client.clone());
                tokio::time::timeout(self.connect_timeout, connect)
                    .await
                    .map_err(|_| StockStoreError::Timeout("connect timed out".to_string()))?
                    .map_err(map_redis_error)
            })
            .await?;
        Ok(manager.clone())
    }
}

impl StockStore for RedisStockStore {
    #[instrument(
        skip(self, request),
        fields(
            available_key = %request.keys.available(),
            reserved_key = %request.keys.reserved(),
            amount = request.amount.get()
        ),
        err
    )]
    fn reserve(&self, request: &ReservationRequest) -> Result<ReservationOutcome, StockStoreError> {
        let mut conn = self.connection()?;

        let reply: redis::Value = self
            .script
            .key(request.keys.available().as_str())
            .key(request.keys.reserved().as_str())
            .arg(request.amount.get())
            .invoke(&mut conn)
            .map_err(map_redis_error)?;

        debug!(?reply, "reservation script replied");
        parse_reply(reply)
    }

    #[instrument(skip(self), err)]
    fn levels(&self, keys: &StockKeys) -> Result<Option<StockLevels>, StockStoreError> {
        let mut conn = self.connection()?;

        // MGET is a single command, so both values come from the same state.
        let (available, reserved): (Option<i64>, Option<i64>) = redis::cmd("MGET")
            .arg(keys.available().as_str())
            .arg(keys.reserved().as_str())
            .query(&mut conn)
            .map_err(map_redis_error)?;

        Ok(available.zip(reserved).map(|(a, r)| StockLevels::new(a, r)))
    }
}

#[async_trait]
impl AsyncStockStore for RedisStockStore {
    async fn reserve_async(
        &self,
        request: &ReservationRequest,
    ) -> Result<ReservationOutcome, StockStoreError> {
        let mut conn = self.async_connection().await?;

        let mut invocation = self.script.prepare_invoke();
        invocation
            .key(request.keys.available().as_str())
            .key(request.keys.reserved().as_str())
            .arg(request.amount.get());

        let reply = invocation.invoke_async::<_, redis::Value>(&mut conn);
        let reply = tokio::time::timeout(self.io_timeout, reply)
            .await
            .map_err(|_| StockStoreError::Timeout("reservation script timed out".to_string()))?
            .map_err(map_redis_error)?;

        parse_reply(reply)
    }

    async fn levels_async(&self, keys: &StockKeys) -> Result<Option<StockLevels>, StockStoreError> {
        let mut conn = self.async_connection().await?;

        let mut cmd = redis::cmd("MGET");
        cmd.arg(keys.available().as_str())
            .arg(keys.reserved().as_str());

        let reply = cmd.query_async::<_, (Option<i64>, Option<i64>)>(&mut conn);
        let (available, reserved) = tokio::time::timeout(self.io_timeout, reply)
            .await
            .map_err(|_| StockStoreError::Timeout("MGET timed out".to_string()))?
            .map_err(map_redis_error)?;

        Ok(available.zip(reserved).map(|(a, r)| StockLevels::new(a, r)))
    }
}

fn map_redis_error(err: redis::RedisError) -> StockStoreError {
    if err.is_timeout() {
        StockStoreError::Timeout(err.to_string())
    } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
        StockStoreError::Connection(err.to_string())
    } else if err.kind() == redis::ErrorKind::TypeError {
        StockStoreError::MalformedResponse(err.to_string())
    } else {
        StockStoreError::Command(err.to_string())
    }
}

/// Decode the script reply `[code, current_amount]`.
fn parse_reply(reply: redis::Value) -> Result<ReservationOutcome, StockStoreError> {
    let items = match reply {
        redis::Value::Bulk(items) => items,
        other => {
            return Err(StockStoreError::MalformedResponse(format!(
                "expected array reply, got {other:?}"
            )));
        }
    };

    let (code, amount) = match items.as_slice() {
        [code] => (code, None),
        [code, amount] => (code, Some(amount)),
        _ => {
            return Err(StockStoreError::MalformedResponse(format!(
                "expected 1 or 2 elements, got {}",
                items.len()
            )));
        }
    };

    let code = match code {
        redis::Value::Int(code) => *code,
        other => {
            return Err(StockStoreError::MalformedResponse(format!(
                "result code is not an integer: {other:?}"
            )));
        }
    };

    let amount = match amount {
        None | Some(redis::Value::Nil) => None,
        Some(redis::Value::Int(amount)) => Some(*amount),
        // Insufficient replies carry the counter exactly as stored.
        Some(redis::Value::Data(bytes)) => Some(parse_amount(bytes)?),
        Some(other) => {
            return Err(StockStoreError::MalformedResponse(format!(
                "current amount is not an integer: {other:?}"
            )));
        }
    };

    ReservationOutcome::from_wire(code, amount)
        .map_err(|e| StockStoreError::MalformedResponse(e.to_string()))
}

fn parse_amount(bytes: &[u8]) -> Result<i64, StockStoreError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|raw| raw.parse::<i64>().ok())
        .ok_or_else(|| {
            StockStoreError::MalformedResponse(format!(
                "current amount is not an integer: {:?}",
                String::from_utf8_lossy(bytes)
            ))
        })
}
