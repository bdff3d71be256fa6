//! Test doubles and common utilities for contract tests
//!
//! The doubles wrap a real `MemoryStore` so expiry semantics stay realistic,
//! and add call counting, injected failures and rendezvous points for
//! reproducing races deterministically.

#![allow(dead_code)]

use async_trait::async_trait;
use bingo_core::error::{Error, Result};
use bingo_core::{BingoConfig, GuessEngine, KvStore, MemoryStore, NumberGenerator};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Barrier;

/// A KvStore over `MemoryStore` that counts calls and can inject faults
pub struct InstrumentedStore {
    inner: MemoryStore,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
    exists_barrier: Option<Arc<Barrier>>,
    fail_expire: bool,
    fail_everything: bool,
    delay: Option<Duration>,
}

impl InstrumentedStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            reads: Arc::new(AtomicUsize::new(0)),
            writes: Arc::new(AtomicUsize::new(0)),
            exists_barrier: None,
            fail_expire: false,
            fail_everything: false,
            delay: None,
        }
    }

    /// Make every `exists` call wait until `parties` callers have arrived
    pub fn with_exists_rendezvous(mut self, parties: usize) -> Self {
        self.exists_barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    /// Make `expire` fail after `set` has already succeeded
    pub fn failing_expire(mut self) -> Self {
        self.fail_expire = true;
        self
    }

    /// Make every operation fail
    pub fn unavailable(mut self) -> Self {
        self.fail_everything = true;
        self
    }

    /// Make every operation take `delay`
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of read operations (exists, get, time_to_live)
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of mutating operations (set, expire, set_if_absent, delete)
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn enter(&self, counter: &AtomicUsize) -> Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_everything {
            return Err(Error::store("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for InstrumentedStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        self.enter(&self.reads).await?;
        let exists = self.inner.exists(key).await?;
        if let Some(barrier) = &self.exists_barrier {
            barrier.wait().await;
        }
        Ok(exists)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.enter(&self.reads).await?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.enter(&self.writes).await?;
        self.inner.set(key, value).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.enter(&self.writes).await?;
        if self.fail_expire {
            return Err(Error::store("connection reset during EXPIRE"));
        }
        self.inner.expire(key, ttl).await
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        self.enter(&self.writes).await?;
        self.inner.set_if_absent(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.enter(&self.writes).await?;
        self.inner.delete(key).await
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>> {
        self.enter(&self.reads).await?;
        self.inner.time_to_live(key).await
    }

    fn backend_name(&self) -> &'static str {
        "instrumented"
    }
}

/// How a `ScriptedGenerator` answers
pub enum Script {
    /// Always the same number
    Fixed(i64),
    /// 1, 2, 3, ... one per call
    Counting,
    /// Transport failure
    Unreachable,
    /// Non-integer body
    Garbage,
    /// Never answers within any sane deadline
    Hang,
}

/// A NumberGenerator that tracks calls
pub struct ScriptedGenerator {
    script: Script,
    calls: Arc<AtomicUsize>,
    next: AtomicI64,
    rendezvous: Option<Arc<Barrier>>,
}

impl ScriptedGenerator {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Arc::new(AtomicUsize::new(0)),
            next: AtomicI64::new(1),
            rendezvous: None,
        }
    }

    /// Hold every call until `parties` callers are inside `generate`
    pub fn with_rendezvous(mut self, parties: usize) -> Self {
        self.rendezvous = Some(Arc::new(Barrier::new(parties)));
        self
    }

    /// Get the number of times generate() was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NumberGenerator for ScriptedGenerator {
    async fn generate(&self) -> Result<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.rendezvous {
            barrier.wait().await;
        }
        match self.script {
            Script::Fixed(n) => Ok(n),
            Script::Counting => Ok(self.next.fetch_add(1, Ordering::SeqCst)),
            Script::Unreachable => Err(Error::generator_unreachable("connection refused")),
            Script::Garbage => Err(Error::generator_response("'lucky' is not an integer")),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
                Ok(0)
            }
        }
    }

    fn generator_name(&self) -> &'static str {
        "scripted"
    }
}

/// Build an engine over shared doubles with default configuration
pub fn engine_with(
    store: Arc<dyn KvStore>,
    generator: Arc<dyn NumberGenerator>,
    config: &BingoConfig,
) -> GuessEngine {
    GuessEngine::from_config(store, generator, config).expect("engine construction succeeds")
}
