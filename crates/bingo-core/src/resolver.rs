//! Daily number resolver
//!
//! Returns the number of the day, generating it on the first request of a
//! cycle.
//!
//! ## Ownership of the key
//!
//! This resolver writes the number itself after a cache miss, with
//! `SET NX PX`, so the value is cached for the rest of the cycle even when
//! the generator does not persist anything. If another request (or the
//! generator service) wrote the key first, the write loses and the stored
//! value is read back and returned, so every request in a cycle observes
//! the same number.
//!
//! Concurrent first requests of a cycle may each call the generator. Only
//! one generated value is ever stored.
//!
//! ```text
//! GET key ── hit ──────────────────────────────────────────► number
//!    │
//!   miss
//!    ▼
//! generator ─► SET key n NX PX ── written ──────────────────► n
//!                     │
//!                   exists
//!                     ▼
//!                  GET key ── hit ──────────────────────────► stored
//!                     └───── miss (expired meanwhile) ──────► n
//! ```

use crate::config::{DailyNumberConfig, DailyNumberExpiry, TimeoutConfig};
use crate::deadline::{generator_call, store_call};
use crate::error::{Error, Result};
use crate::traits::{KvStore, NumberGenerator};
use chrono::{DateTime, Days, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Resolves the shared number of the day
pub struct DailyNumberResolver {
    store: Arc<dyn KvStore>,
    generator: Arc<dyn NumberGenerator>,
    key: String,
    expiry: DailyNumberExpiry,
    store_timeout: Duration,
    generator_timeout: Duration,
}

impl DailyNumberResolver {
    /// Create a resolver
    ///
    /// # Parameters
    ///
    /// - `store`: Shared key-value store
    /// - `generator`: Producer of new numbers
    /// - `config`: Key name and expiry policy
    /// - `timeouts`: Deadlines for store and generator calls
    pub fn new(
        store: Arc<dyn KvStore>,
        generator: Arc<dyn NumberGenerator>,
        config: &DailyNumberConfig,
        timeouts: &TimeoutConfig,
    ) -> Self {
        Self {
            store,
            generator,
            key: config.key.clone(),
            expiry: config.expiry,
            store_timeout: timeouts.store(),
            generator_timeout: timeouts.generator(),
        }
    }

    /// Return today's number, generating and caching it on a miss
    ///
    /// # Returns
    ///
    /// - `Ok(n)`: The number of the current cycle
    /// - `Err(Error::StoreUnavailable)`: Store failure, timeout, or a stored value that is not an integer
    /// - `Err(Error::GeneratorUnreachable)`: Generator transport failure or timeout
    /// - `Err(Error::GeneratorResponseInvalid)`: Generator answered with a non-integer
    pub async fn number_of_the_day(&self) -> Result<i64> {
        if let Some(number) = self.read_cached().await? {
            debug!(number, "number of the day served from store");
            return Ok(number);
        }

        let generated = generator_call(self.generator_timeout, self.generator.generate())
            .await
            .inspect_err(|e| {
                error!(
                    generator = self.generator.generator_name(),
                    error = %e,
                    "failed to generate number of the day"
                )
            })?;

        let ttl = self.lifetime_from(Utc::now());
        let written = store_call(
            self.store_timeout,
            "SET NX PX",
            self.store.set_if_absent(&self.key, &generated.to_string(), ttl),
        )
        .await
        .inspect_err(|e| error!(key = %self.key, error = %e, "failed to cache number of the day"))?;

        if written {
            info!(number = generated, ttl_secs = ttl.as_secs(), "number of the day generated");
            return Ok(generated);
        }

        // Someone else stored a number first; theirs is authoritative
        match self.read_cached().await? {
            Some(stored) => {
                if stored != generated {
                    debug!(stored, generated, "discarding generated number, another writer won");
                }
                Ok(stored)
            }
            None => {
                warn!(number = generated, "cached number vanished right after a lost write");
                Ok(generated)
            }
        }
    }

    /// Lifetime for a number first written at `now`
    pub fn lifetime_from(&self, now: DateTime<Utc>) -> Duration {
        match self.expiry {
            DailyNumberExpiry::Rolling { secs } => Duration::from_secs(secs),
            DailyNumberExpiry::UntilMidnightUtc => until_next_midnight(now),
        }
    }

    async fn read_cached(&self) -> Result<Option<i64>> {
        let raw = store_call(self.store_timeout, "GET", self.store.get(&self.key))
            .await
            .inspect_err(|e| error!(key = %self.key, error = %e, "failed to read number of the day"))?;

        raw.map(|value| {
            value.trim().parse::<i64>().map_err(|_| {
                Error::store(format!(
                    "value under '{}' is not an integer: '{}'",
                    self.key, value
                ))
            })
        })
        .transpose()
    }
}

/// Time left until the next UTC day boundary, never zero
fn until_next_midnight(now: DateTime<Utc>) -> Duration {
    let next_midnight = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc());

    match next_midnight {
        Some(deadline) => (deadline - now)
            .to_std()
            .unwrap_or(Duration::from_secs(1))
            .max(Duration::from_secs(1)),
        None => Duration::from_secs(86_400),
    }
}
