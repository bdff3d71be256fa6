//! Configuration types for the bingo service
//!
//! This module defines all configuration structures used throughout the crate.
//! Values are injected at construction time; nothing in the core reads the
//! environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main bingo configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BingoConfig {
    /// Key-value store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Number generator configuration
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Per-user quota settings
    #[serde(default)]
    pub quota: QuotaConfig,

    /// Number-of-the-day settings
    #[serde(default)]
    pub daily_number: DailyNumberConfig,

    /// Deadlines applied by the core to every backend call
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

impl BingoConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.store.validate()?;
        self.generator.validate()?;
        self.quota.validate()?;
        self.daily_number.validate()?;
        self.timeouts.validate()?;

        // Player keys must never be able to name the daily number key
        if self.daily_number.key.starts_with(&self.quota.key_prefix) {
            return Err(crate::Error::config(
                "Daily number key must not live under the player key prefix",
            ));
        }

        Ok(())
    }
}

/// Key-value store configuration
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-memory store (not shared between processes)
    #[default]
    Memory,

    /// Redis store
    Redis {
        /// `host:port` of the Redis server
        address: String,
        /// Credential sent on connect
        password: Option<String>,
        /// Logical database index
        #[serde(default)]
        db: i64,
    },
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::Memory => Ok(()),
            StoreConfig::Redis { address, db, .. } => {
                let Some((host, port)) = address.rsplit_once(':') else {
                    return Err(crate::Error::config(format!(
                        "Redis address must be host:port, got '{}'",
                        address
                    )));
                };
                if host.is_empty() {
                    return Err(crate::Error::config("Redis host cannot be empty"));
                }
                if port.parse::<u16>().is_err() {
                    return Err(crate::Error::config(format!(
                        "Redis port is not a valid port number: '{}'",
                        port
                    )));
                }
                if *db < 0 {
                    return Err(crate::Error::config("Redis db index must be >= 0"));
                }
                Ok(())
            }
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &'static str {
        match self {
            StoreConfig::Memory => "memory",
            StoreConfig::Redis { .. } => "redis",
        }
    }
}

// The Redis password must never reach logs
impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Memory => f.write_str("Memory"),
            StoreConfig::Redis { address, password, db } => f
                .debug_struct("Redis")
                .field("address", address)
                .field("password", &password.as_ref().map(|_| "<REDACTED>"))
                .field("db", db)
                .finish(),
        }
    }
}

/// Number generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Full URL of the trigger endpoint
    #[serde(default = "default_generator_url")]
    pub url: String,
}

impl GeneratorConfig {
    /// Validate the generator configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("Generator URL cannot be empty"));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "Generator URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        Ok(())
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            url: default_generator_url(),
        }
    }
}

/// How the "first play of the day" decision is made
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuotaStrategy {
    /// Single `SET NX PX`; one winner under concurrency
    #[default]
    Atomic,
    /// `EXISTS`, then `SET`, then `EXPIRE`; concurrent first requests can all win
    CheckThenSet,
}

impl std::str::FromStr for QuotaStrategy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "atomic" => Ok(QuotaStrategy::Atomic),
            "check-then-set" => Ok(QuotaStrategy::CheckThenSet),
            other => Err(crate::Error::config(format!(
                "Unknown quota strategy '{}'. Valid: atomic, check-then-set",
                other
            ))),
        }
    }
}

/// Per-user quota settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Prefix prepended to the user name to form the record key
    #[serde(default = "default_player_key_prefix")]
    pub key_prefix: String,

    /// Lifetime of a play record (in seconds)
    #[serde(default = "default_play_lifetime_secs")]
    pub lifetime_secs: u64,

    /// Check-and-record strategy
    #[serde(default)]
    pub strategy: QuotaStrategy,
}

impl QuotaConfig {
    /// Validate the quota settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.key_prefix.is_empty() {
            return Err(crate::Error::config("Player key prefix cannot be empty"));
        }
        if self.lifetime_secs == 0 {
            return Err(crate::Error::config("Play record lifetime must be > 0"));
        }
        Ok(())
    }

    /// Play record lifetime as a [`Duration`]
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_player_key_prefix(),
            lifetime_secs: default_play_lifetime_secs(),
            strategy: QuotaStrategy::default(),
        }
    }
}

/// Lifetime applied to the number of the day when this service writes it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum DailyNumberExpiry {
    /// Expire a fixed number of seconds after the first write
    Rolling {
        /// Lifetime in seconds
        secs: u64,
    },
    /// Expire at the next UTC day boundary
    UntilMidnightUtc,
}

impl Default for DailyNumberExpiry {
    fn default() -> Self {
        DailyNumberExpiry::Rolling {
            secs: default_play_lifetime_secs(),
        }
    }
}

impl std::str::FromStr for DailyNumberExpiry {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rolling" => Ok(DailyNumberExpiry::default()),
            "midnight-utc" => Ok(DailyNumberExpiry::UntilMidnightUtc),
            other => Err(crate::Error::config(format!(
                "Unknown daily number expiry '{}'. Valid: rolling, midnight-utc",
                other
            ))),
        }
    }
}

/// Number-of-the-day settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyNumberConfig {
    /// Well-known key holding the number
    #[serde(default = "default_daily_number_key")]
    pub key: String,

    /// Lifetime policy for values written by this service
    #[serde(default)]
    pub expiry: DailyNumberExpiry,
}

impl DailyNumberConfig {
    /// Validate the number-of-the-day settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.key.is_empty() {
            return Err(crate::Error::config("Daily number key cannot be empty"));
        }
        if let DailyNumberExpiry::Rolling { secs: 0 } = self.expiry {
            return Err(crate::Error::config("Daily number lifetime must be > 0"));
        }
        Ok(())
    }
}

impl Default for DailyNumberConfig {
    fn default() -> Self {
        Self {
            key: default_daily_number_key(),
            expiry: DailyNumberExpiry::default(),
        }
    }
}

/// Deadlines applied by the core around backend calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Deadline for a single store operation (in milliseconds)
    #[serde(default = "default_store_timeout_ms")]
    pub store_ms: u64,

    /// Deadline for a generator call (in milliseconds)
    #[serde(default = "default_generator_timeout_ms")]
    pub generator_ms: u64,
}

impl TimeoutConfig {
    /// Validate the deadlines
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.store_ms == 0 {
            return Err(crate::Error::config("Store timeout must be > 0"));
        }
        if self.generator_ms == 0 {
            return Err(crate::Error::config("Generator timeout must be > 0"));
        }
        Ok(())
    }

    /// Store deadline as a [`Duration`]
    pub fn store(&self) -> Duration {
        Duration::from_millis(self.store_ms)
    }

    /// Generator deadline as a [`Duration`]
    pub fn generator(&self) -> Duration {
        Duration::from_millis(self.generator_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            store_ms: default_store_timeout_ms(),
            generator_ms: default_generator_timeout_ms(),
        }
    }
}

fn default_generator_url() -> String {
    "http://bingo-generator:8000/trigger".to_string()
}

fn default_player_key_prefix() -> String {
    "player:".to_string()
}

fn default_play_lifetime_secs() -> u64 {
    86_400
}

fn default_daily_number_key() -> String {
    "bingoNumberOfTheDay".to_string()
}

fn default_store_timeout_ms() -> u64 {
    2_000
}

fn default_generator_timeout_ms() -> u64 {
    5_000
}
