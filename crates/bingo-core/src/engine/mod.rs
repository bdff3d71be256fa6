//! Guess engine
//!
//! The GuessEngine sequences the quota tracker and the daily number resolver
//! for one submitted guess:
//!
//! ```text
//!            ┌──────────────┐
//! guess ───► │ GuessEngine  │
//!            └──────────────┘
//!                   │
//!      ┌────────────┴─────────────┐
//!      ▼                          ▼
//! ┌──────────────┐       ┌──────────────────────┐
//! │ QuotaTracker │       │ DailyNumberResolver  │
//! │ (1st play?)  │       │ (only on first play) │
//! └──────────────┘       └──────────────────────┘
//! ```
//!
//! ## Flow
//!
//! 1. Check-and-record the play; already played → `AlreadyPlayed`
//! 2. Parse the guess; malformed → release the play, `InvalidInput`
//! 3. Resolve the number; failure → release the play, return the error
//! 4. Classify → `Win` / `Lose`
//!
//! A released play means the user is only charged for guesses that were
//! actually compared against the number. Release is best effort: if it fails,
//! or if the request outlived its own record, the record stays and expires
//! with its normal lifetime.

use crate::config::BingoConfig;
use crate::error::Result;
use crate::outcome::{Outcome, parse_guess};
use crate::quota::QuotaTracker;
use crate::resolver::DailyNumberResolver;
use crate::traits::{KvStore, NumberGenerator};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Evaluated guess, ready to be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Classified outcome
    pub outcome: Outcome,
    /// Message addressed to the player
    pub message: String,
}

/// Orchestrates one guess end to end
///
/// The engine holds no per-request state and is shared by all request
/// tasks behind an `Arc`.
pub struct GuessEngine {
    quota: QuotaTracker,
    resolver: DailyNumberResolver,
}

impl GuessEngine {
    /// Create an engine from its two components
    pub fn new(quota: QuotaTracker, resolver: DailyNumberResolver) -> Self {
        Self { quota, resolver }
    }

    /// Build both components over a shared store from configuration
    ///
    /// # Parameters
    ///
    /// - `store`: Shared key-value store
    /// - `generator`: Number generator
    /// - `config`: Service configuration (validated here)
    pub fn from_config(
        store: Arc<dyn KvStore>,
        generator: Arc<dyn NumberGenerator>,
        config: &BingoConfig,
    ) -> Result<Self> {
        config.validate()?;

        let quota = QuotaTracker::new(store.clone(), &config.quota, config.timeouts.store());
        let resolver =
            DailyNumberResolver::new(store, generator, &config.daily_number, &config.timeouts);

        Ok(Self::new(quota, resolver))
    }

    /// Evaluate `guess` submitted by `name`
    ///
    /// # Returns
    ///
    /// - `Ok(Evaluation)`: One of the four outcomes
    /// - `Err(Error::InvalidInput)`: Empty name
    /// - `Err(Error::StoreUnavailable | GeneratorUnreachable | GeneratorResponseInvalid)`: Backend failure
    pub async fn evaluate(&self, name: &str, guess: &str) -> Result<Evaluation> {
        let recorded_at = Instant::now();
        let already_played = self.quota.check_and_record_play(name).await?;
        if already_played {
            return Ok(self.render(Outcome::AlreadyPlayed, name, guess));
        }

        let Some(parsed) = parse_guess(guess) else {
            debug!(user = name, guess, "guess is not a number");
            self.release(name, recorded_at).await;
            return Ok(self.render(Outcome::InvalidInput, name, guess));
        };

        let number = match self.resolver.number_of_the_day().await {
            Ok(number) => number,
            Err(e) => {
                self.release(name, recorded_at).await;
                return Err(e);
            }
        };

        let outcome = Outcome::classify(already_played, Some(parsed), number);
        Ok(self.render(outcome, name, guess))
    }

    fn render(&self, outcome: Outcome, name: &str, guess: &str) -> Evaluation {
        Evaluation {
            outcome,
            message: outcome.message(name, guess),
        }
    }

    async fn release(&self, name: &str, recorded_at: Instant) {
        if let Err(e) = self.quota.release_play(name, recorded_at).await {
            warn!(user = name, error = %e, "failed to release play record; it will expire normally");
        }
    }
}
