// # Key-Value Store Trait
//
// Defines the interface to the shared, TTL-capable store that holds the
// per-user play records and the number of the day.
//
// ## Purpose
//
// The store is the only shared state between requests. Every decision the
// service makes ("has this user played?", "what is today's number?") is a
// read of this store, and every durable effect is a write to it.
//
// ## Implementations
//
// - In-memory: `MemoryStore` (local runs, tests)
// - Redis: `bingo-store-redis`
//
// ## Usage
//
// ```rust
// use bingo_core::KvStore;
// use std::time::Duration;
//
// async fn first_play(store: &dyn KvStore, user: &str) -> bingo_core::Result<bool> {
//     store.set_if_absent(user, "1", Duration::from_secs(86_400)).await
// }
// ```

use async_trait::async_trait;
use std::time::Duration;

/// Trait for key-value store implementations
///
/// Implementations must be thread-safe and usable across async tasks. The
/// core holds them as `Arc<dyn KvStore>` and calls them concurrently from
/// every in-flight request.
///
/// # Connection Handling
///
/// Authentication happens when the implementation is constructed, never
/// per call. Any per-call connection or handle must be acquired inside the
/// method and released on every exit path, including errors.
///
/// # Errors
///
/// Every failure (connectivity, authentication, protocol, malformed reply)
/// is reported as [`crate::Error::StoreUnavailable`].
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Check whether a key is present and not expired
    async fn exists(&self, key: &str) -> Result<bool, crate::Error>;

    /// Read the value stored under a key
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: The key is present
    /// - `Ok(None)`: The key is absent or expired
    /// - `Err(Error)`: Storage error
    async fn get(&self, key: &str) -> Result<Option<String>, crate::Error>;

    /// Write a value unconditionally
    ///
    /// Like Redis `SET` without options, this clears any lifetime the key
    /// previously had.
    async fn set(&self, key: &str, value: &str) -> Result<(), crate::Error>;

    /// Set the remaining lifetime of a key
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: Lifetime applied
    /// - `Ok(false)`: The key does not exist
    /// - `Err(Error)`: Storage error
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, crate::Error>;

    /// Atomically write a value with a lifetime, only if the key is absent
    ///
    /// This is the `SET key value NX PX ttl` primitive. Exactly one of any
    /// number of concurrent callers racing on an absent key observes `true`.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: The value was written
    /// - `Ok(false)`: The key already existed; nothing was written
    /// - `Err(Error)`: Storage error
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, crate::Error>;

    /// Remove a key
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: The key existed and was removed
    /// - `Ok(false)`: The key did not exist
    async fn delete(&self, key: &str) -> Result<bool, crate::Error>;

    /// Remaining lifetime of a key
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ttl))`: The key exists and will expire after `ttl`
    /// - `Ok(None)`: The key is absent, or exists without a lifetime
    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, crate::Error>;

    /// Name of the backing store, for logs
    fn backend_name(&self) -> &'static str;
}
