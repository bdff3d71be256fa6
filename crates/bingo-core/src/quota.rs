//! Quota tracker
//!
//! Enforces at most one play per user per cycle. The presence of a player's
//! record in the store is the only source of truth for "already played";
//! the record carries its own lifetime and is never updated in place.
//!
//! ## Strategies
//!
//! - [`QuotaStrategy::Atomic`]: one `SET key 1 NX PX lifetime`. Concurrent
//!   first requests from the same user get exactly one "first play".
//! - [`QuotaStrategy::CheckThenSet`]: `EXISTS`, `SET`, `EXPIRE` as three
//!   separate calls. Two concurrent first requests can both observe the key
//!   as absent and both be granted a play, and a failure between `SET` and
//!   `EXPIRE` leaves a record that never expires. Kept for deployments that
//!   must match the legacy behavior exactly.
//!
//! ## Release
//!
//! Records all carry the same marker, so a release cannot tell its own record
//! from one written by a later cycle. It only deletes while the caller's
//! record is certainly still alive: less than `lifetime - store_timeout`
//! after the caller started recording it.

use crate::config::{QuotaConfig, QuotaStrategy};
use crate::deadline::store_call;
use crate::error::{Error, Result};
use crate::traits::KvStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Value stored in a play record
const PLAY_MARKER: &str = "1";

/// Per-user daily quota
pub struct QuotaTracker {
    store: Arc<dyn KvStore>,
    key_prefix: String,
    lifetime: Duration,
    strategy: QuotaStrategy,
    store_timeout: Duration,
}

impl QuotaTracker {
    /// Create a quota tracker
    ///
    /// # Parameters
    ///
    /// - `store`: Shared key-value store
    /// - `config`: Key prefix, record lifetime and strategy
    /// - `store_timeout`: Deadline for each store call
    pub fn new(store: Arc<dyn KvStore>, config: &QuotaConfig, store_timeout: Duration) -> Self {
        Self {
            store,
            key_prefix: config.key_prefix.clone(),
            lifetime: config.lifetime(),
            strategy: config.strategy,
            store_timeout,
        }
    }

    /// Store key of a user's play record
    pub fn record_key(&self, user: &str) -> String {
        format!("{}{}", self.key_prefix, user)
    }

    /// Determine whether `user` already played this cycle, recording the play if not
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: The user already played; nothing was written
    /// - `Ok(false)`: First play of the cycle; a record now exists
    /// - `Err(Error::InvalidInput)`: Empty user
    /// - `Err(Error::StoreUnavailable)`: Any store failure or timeout
    pub async fn check_and_record_play(&self, user: &str) -> Result<bool> {
        if user.is_empty() {
            return Err(Error::invalid_input("user name cannot be empty"));
        }

        let key = self.record_key(user);
        let already_played = match self.strategy {
            QuotaStrategy::Atomic => !self.record_atomically(&key).await?,
            QuotaStrategy::CheckThenSet => self.check_then_record(&key).await?,
        };

        if already_played {
            info!(user, "user has already played today");
        } else {
            info!(user, "user plays for the first time today");
        }
        Ok(already_played)
    }

    /// Remove a user's play record
    ///
    /// Used when a recorded play never reached evaluation, so the user is
    /// not charged for it. `recorded_at` is taken before the call to
    /// [`check_and_record_play`](Self::check_and_record_play) that wrote the
    /// record.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: The release was applied
    /// - `Ok(false)`: The record may already belong to a later cycle; nothing was deleted
    pub async fn release_play(&self, user: &str, recorded_at: Instant) -> Result<bool> {
        let elapsed = recorded_at.elapsed();
        if elapsed + self.store_timeout >= self.lifetime {
            warn!(
                user,
                elapsed_ms = elapsed.as_millis() as u64,
                "play record may have been renewed, not releasing"
            );
            return Ok(false);
        }

        let key = self.record_key(user);
        let removed = store_call(self.store_timeout, "DEL", self.store.delete(&key)).await?;
        debug!(user, removed, "released play record");
        Ok(true)
    }

    async fn record_atomically(&self, key: &str) -> Result<bool> {
        store_call(
            self.store_timeout,
            "SET NX PX",
            self.store.set_if_absent(key, PLAY_MARKER, self.lifetime),
        )
        .await
        .inspect_err(|e| error!(key, error = %e, "failed to record play"))
    }

    async fn check_then_record(&self, key: &str) -> Result<bool> {
        let exists = store_call(self.store_timeout, "EXISTS", self.store.exists(key))
            .await
            .inspect_err(|e| error!(key, error = %e, "failed to check play record"))?;
        if exists {
            return Ok(true);
        }

        store_call(self.store_timeout, "SET", self.store.set(key, PLAY_MARKER))
            .await
            .inspect_err(|e| error!(key, error = %e, "failed to write play record"))?;

        // A failure here leaves the record without a lifetime
        store_call(
            self.store_timeout,
            "EXPIRE",
            self.store.expire(key, self.lifetime),
        )
        .await
        .inspect_err(|e| error!(key, error = %e, "failed to set play record expiry"))?;

        Ok(false)
    }
}
