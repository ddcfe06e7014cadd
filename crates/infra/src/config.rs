//! Configuration loading and representation.
//!
//! Connection parameters are read from the environment once, at store
//! construction time.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 6379;
const DEFAULT_DB: i64 = 0;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_IO_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Redis connection parameters.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    /// Logical database index.
    pub db: i64,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    pub connect_timeout: Duration,
    /// Read/write timeout for each round trip.
    pub io_timeout: Duration,
}

impl fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db", &self.db)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout", &self.connect_timeout)
            .field("io_timeout", &self.io_timeout)
            .finish()
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db: DEFAULT_DB,
            password: None,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            io_timeout: Duration::from_millis(DEFAULT_IO_TIMEOUT_MS),
        }
    }
}

impl RedisConfig {
    /// Load from `REDIS_HOST`, `REDIS_PORT`, `REDIS_DB`, `REDIS_PASSWORD`,
    /// `REDIS_CONNECT_TIMEOUT_MS` and `REDIS_IO_TIMEOUT_MS`.
    ///
    /// Unset variables fall back to defaults; malformed ones are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`RedisConfig::from_env`] with an injectable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = lookup("REDIS_HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(defaults.host);
        let port = parse_var(&lookup, "REDIS_PORT")?.unwrap_or(defaults.port);
        let db = parse_var(&lookup, "REDIS_DB")?.unwrap_or(defaults.db);
        if db < 0 {
            return Err(ConfigError::Invalid {
                var: "REDIS_DB",
                reason: "database index cannot be negative".to_string(),
            });
        }
        let password = lookup("REDIS_PASSWORD").filter(|p| !p.is_empty());
        let connect_timeout = parse_var::<u64>(&lookup, "REDIS_CONNECT_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.connect_timeout);
        let io_timeout = parse_var::<u64>(&lookup, "REDIS_IO_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.io_timeout);

        for (var, timeout) in [
            ("REDIS_CONNECT_TIMEOUT_MS", connect_timeout),
            ("REDIS_IO_TIMEOUT_MS", io_timeout),
        ] {
            // The redis client rejects zero socket timeouts.
            if timeout.is_zero() {
                return Err(ConfigError::Invalid {
                    var,
                    reason: "timeout must be greater than zero".to_string(),
                });
            }
        }

        Ok(Self {
            host,
            port,
            db,
            password,
            connect_timeout,
            io_timeout,
        })
    }

    #[cfg(feature = "redis")]
    pub fn connection_info(&self) -> redis::ConnectionInfo {
        redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: redis::RedisConnectionInfo {
                db: self.db,
                password: self.password.clone(),
                ..Default::default()
            },
        }
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                var,
                reason: format!("'{raw}': {e}"),
            }),
    }
}
