// # Redis Store
//
// This crate provides the Redis implementation of `KvStore`.
//
// ## Key Layout
//
// ```text
// player:{name}          → "1"             (PX = play lifetime)
// bingoNumberOfTheDay    → decimal integer (PX = daily number policy)
// ```
//
// ## Connection Model
//
// - One `ConnectionManager` per process: a multiplexed connection that is
//   safe to use from many tasks and reconnects on its own
// - Each operation clones the manager handle; the clone is dropped when the
//   operation returns, on success and on error
// - `AUTH` happens once per (re)connection from the injected password, never
//   per command
//
// ## Security
//
// The password NEVER appears in logs or in Debug output.

use async_trait::async_trait;
use bingo_core::config::StoreConfig;
use bingo_core::{Error, KvStore, Result};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use std::time::Duration;

/// Default deadline for establishing the first connection
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Redis-backed key-value store
#[derive(Clone)]
pub struct RedisStore {
    /// `host:port` of the server, for logs
    address: String,

    /// Shared multiplexed connection
    conn: ConnectionManager,
}

// Custom Debug implementation that hides the connection internals
impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect and authenticate
    ///
    /// # Parameters
    ///
    /// - `address`: `host:port` of the Redis server
    /// - `password`: Credential sent with `AUTH` on every (re)connection
    /// - `db`: Logical database index
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the address is malformed, the server is
    /// unreachable, authentication fails, or the connection is not
    /// established within the connect timeout.
    pub async fn connect(address: &str, password: Option<&str>, db: i64) -> Result<Self> {
        let info = connection_info(address, password, db)?;
        let client = Client::open(info).map_err(store_err)?;

        let conn = tokio::time::timeout(DEFAULT_CONNECT_TIMEOUT, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                Error::store(format!(
                    "connecting to {} timed out after {:?}",
                    address, DEFAULT_CONNECT_TIMEOUT
                ))
            })?
            .map_err(store_err)?;

        tracing::info!(address, db, "connected to Redis");
        Ok(Self {
            address: address.to_string(),
            conn,
        })
    }

    /// Connect using a `StoreConfig::Redis` entry
    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        match config {
            StoreConfig::Redis {
                address,
                password,
                db,
            } => Self::connect(address, password.as_deref(), *db).await,
            _ => Err(Error::config("Invalid config for Redis store")),
        }
    }

    /// Server address
    pub fn address(&self) -> &str {
        &self.address
    }
}

/// Build connection parameters from `host:port`, password and db index
fn connection_info(address: &str, password: Option<&str>, db: i64) -> Result<ConnectionInfo> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| Error::config(format!("Redis address must be host:port, got '{}'", address)))?;
    let port: u16 = port
        .parse()
        .map_err(|_| Error::config(format!("Invalid Redis port: '{}'", port)))?;

    Ok(ConnectionInfo {
        addr: ConnectionAddr::Tcp(host.to_string(), port),
        redis: RedisConnectionInfo {
            db,
            password: password.filter(|p| !p.is_empty()).map(str::to_string),
            ..Default::default()
        },
    })
}

/// Lifetime in whole milliseconds, never zero (Redis rejects `PX 0`)
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Interpret a `PTTL` reply: -2 absent, -1 no expiry
fn pttl_to_duration(reply: i64) -> Option<Duration> {
    u64::try_from(reply).ok().map(Duration::from_millis)
}

fn store_err(err: redis::RedisError) -> Error {
    Error::store(err.to_string())
}

#[async_trait]
impl KvStore for RedisStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await.map_err(store_err)?;
        Ok(exists)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.map_err(store_err)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await.map_err(store_err)?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let millis = i64::try_from(ttl_millis(ttl)).unwrap_or(i64::MAX);
        let applied: bool = conn.pexpire(key, millis).await.map_err(store_err)?;
        Ok(applied)
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        // SET replies OK when written and nil when NX refused the write
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await.map_err(store_err)?;
        Ok(removed > 0)
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>> {
        let mut conn = self.conn.clone();
        let reply: i64 = conn.pttl(key).await.map_err(store_err)?;
        Ok(pttl_to_duration(reply))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
