// # Memory Store
//
// In-memory implementation of KvStore.
//
// ## Purpose
//
// Provides a process-local store with the same expiry semantics as Redis.
// Useful for testing and for single-instance local runs.
//
// ## Crash Behavior
//
// - All play records and the cached number are lost on restart
// - After a restart every user may play again and a new number is generated
//
// ## Expiry
//
// An expired entry is invisible to every operation. It is purged the next
// time its key is touched, or by the sweep that runs on insert once the map
// reaches the sweep threshold. After each sweep the threshold becomes twice
// the surviving entry count (at least `MIN_SWEEP_THRESHOLD`), so sweeping
// stays amortized O(1) per insert. Time is read from `tokio::time::Instant`,
// so tests can pause and advance the clock.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::Error;
use crate::traits::KvStore;

/// Map size below which inserts never sweep
const MIN_SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| deadline > now)
    }
}

#[derive(Debug)]
struct Entries {
    map: HashMap<String, Entry>,
    sweep_at: usize,
}

impl Default for Entries {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            sweep_at: MIN_SWEEP_THRESHOLD,
        }
    }
}

impl Entries {
    fn insert(&mut self, key: &str, entry: Entry, now: Instant) {
        if self.map.len() >= self.sweep_at && !self.map.contains_key(key) {
            self.sweep(now);
        }
        self.map.insert(key.to_string(), entry);
    }

    fn sweep(&mut self, now: Instant) -> usize {
        let before = self.map.len();
        self.map.retain(|_, entry| entry.is_live(now));
        self.sweep_at = (self.map.len() * 2).max(MIN_SWEEP_THRESHOLD);
        before - self.map.len()
    }
}

/// In-memory key-value store
///
/// All entries live in a HashMap protected by a RwLock. Every mutating
/// operation takes the write lock for its whole duration, which makes
/// [`KvStore::set_if_absent`] atomic.
///
/// # Example
///
/// ```rust,no_run
/// use bingo_core::store::MemoryStore;
/// use bingo_core::traits::KvStore;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStore::new();
///
///     assert!(store.set_if_absent("player:alice", "1", Duration::from_secs(60)).await?);
///     assert!(!store.set_if_absent("player:alice", "1", Duration::from_secs(60)).await?);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Entries>>,
}

impl MemoryStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) keys
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let guard = self.inner.read().await;
        guard.map.values().filter(|entry| entry.is_live(now)).count()
    }

    /// Check if the store holds no live keys
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn live_entry(&self, key: &str) -> Option<Entry> {
        let now = Instant::now();
        let guard = self.inner.read().await;
        guard.map.get(key).filter(|entry| entry.is_live(now)).cloned()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, Error> {
        Ok(self.live_entry(key).await.is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.live_entry(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let now = Instant::now();
        let mut guard = self.inner.write().await;
        guard.insert(
            key,
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
            now,
        );
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, Error> {
        let now = Instant::now();
        let mut guard = self.inner.write().await;
        match guard.map.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            Some(_) => {
                guard.map.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, Error> {
        let now = Instant::now();
        let mut guard = self.inner.write().await;
        if guard.map.get(key).is_some_and(|entry| entry.is_live(now)) {
            return Ok(false);
        }
        guard.insert(
            key,
            Entry {
                value: value.to_string(),
                expires_at: Some(now + ttl),
            },
            now,
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool, Error> {
        let now = Instant::now();
        let mut guard = self.inner.write().await;
        Ok(guard.map.remove(key).is_some_and(|entry| entry.is_live(now)))
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, Error> {
        let now = Instant::now();
        Ok(self
            .live_entry(key)
            .await
            .and_then(|entry| entry.expires_at)
            .map(|deadline| deadline.saturating_duration_since(now)))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
