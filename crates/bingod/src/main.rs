// # bingod - Bingo Daemon
//
// Thin integration layer: all quota and number logic lives in bingo-core.
//
// The bingod daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Connecting the store and the generator client
// 4. Serving the HTTP surface until SIGTERM/SIGINT
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Server
// - `BINGO_BIND_ADDR`: Listen address (default `0.0.0.0:8000`)
// - `BINGO_LOG_LEVEL`: trace, debug, info, warn, error (default `info`)
//
// ### Store
// - `BINGO_STORE_TYPE`: redis or memory (default `redis`)
// - `BINGO_REDIS_ADDR`: `host:port` (default `redis-master:6379`)
// - `REDIS_PASSWORD`: Redis credential
// - `BINGO_REDIS_DB`: Logical database (default `0`)
// - `BINGO_STORE_TIMEOUT_MS`: Deadline per store call (default `2000`)
//
// ### Generator
// - `BINGO_GENERATOR_URL`: Trigger endpoint (default `http://bingo-generator:8000/trigger`)
// - `BINGO_GENERATOR_TIMEOUT_MS`: Deadline per generator call (default `5000`)
//
// ### Game
// - `BINGO_QUOTA_STRATEGY`: atomic or check-then-set (default `atomic`)
// - `BINGO_PLAYER_KEY_PREFIX`: Prefix of play record keys (default `player:`)
// - `BINGO_DAILY_NUMBER_KEY`: Key of the number of the day (default `bingoNumberOfTheDay`)
// - `BINGO_DAILY_NUMBER_EXPIRY`: rolling or midnight-utc (default `rolling`)
//
// ## Example
//
// ```bash
// export REDIS_PASSWORD=...
// export BINGO_REDIS_ADDR=redis-master:6379
// export BINGO_GENERATOR_URL=http://bingo-generator:8000/trigger
//
// bingod
// ```

mod http;

use anyhow::{Context, Result};
use bingo_core::config::{
    BingoConfig, DailyNumberConfig, DailyNumberExpiry, GeneratorConfig, QuotaConfig,
    QuotaStrategy, StoreConfig, TimeoutConfig,
};
use bingo_core::{GuessEngine, KvStore, MemoryStore, NumberGenerator};
use bingo_generator_http::HttpNumberGenerator;
use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Time allowed for in-flight requests to finish after a shutdown signal
const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum BingoExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<BingoExitCode> for ExitCode {
    fn from(code: BingoExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    bind_addr: SocketAddr,
    store_type: String,
    redis_addr: String,
    redis_password: Option<String>,
    redis_db: i64,
    store_timeout_ms: u64,
    generator_url: String,
    generator_timeout_ms: u64,
    quota_strategy: QuotaStrategy,
    player_key_prefix: String,
    daily_number_key: String,
    daily_number_expiry: DailyNumberExpiry,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            bind_addr: env_or("BINGO_BIND_ADDR", "0.0.0.0:8000")
                .parse()
                .context("invalid BINGO_BIND_ADDR")?,
            store_type: env_or("BINGO_STORE_TYPE", "redis").to_lowercase(),
            redis_addr: env_or("BINGO_REDIS_ADDR", "redis-master:6379"),
            redis_password: env::var("REDIS_PASSWORD").ok().filter(|p| !p.is_empty()),
            redis_db: env_or("BINGO_REDIS_DB", "0")
                .parse()
                .context("invalid BINGO_REDIS_DB")?,
            store_timeout_ms: env_or("BINGO_STORE_TIMEOUT_MS", "2000")
                .parse()
                .context("invalid BINGO_STORE_TIMEOUT_MS")?,
            generator_url: env_or("BINGO_GENERATOR_URL", "http://bingo-generator:8000/trigger"),
            generator_timeout_ms: env_or("BINGO_GENERATOR_TIMEOUT_MS", "5000")
                .parse()
                .context("invalid BINGO_GENERATOR_TIMEOUT_MS")?,
            quota_strategy: env_or("BINGO_QUOTA_STRATEGY", "atomic")
                .parse()
                .context("invalid BINGO_QUOTA_STRATEGY")?,
            player_key_prefix: env_or("BINGO_PLAYER_KEY_PREFIX", "player:"),
            daily_number_key: env_or("BINGO_DAILY_NUMBER_KEY", "bingoNumberOfTheDay"),
            daily_number_expiry: env_or("BINGO_DAILY_NUMBER_EXPIRY", "rolling")
                .parse()
                .context("invalid BINGO_DAILY_NUMBER_EXPIRY")?,
            log_level: env_or("BINGO_LOG_LEVEL", "info"),
        })
    }

    /// Validate the configuration
    ///
    /// Daemon-level checks happen here; everything the core owns is
    /// checked by [`BingoConfig::validate`].
    fn validate(&self) -> Result<()> {
        match self.store_type.as_str() {
            "redis" => {
                if !cfg!(feature = "redis") {
                    anyhow::bail!(
                        "BINGO_STORE_TYPE=redis but bingod was built without the 'redis' feature"
                    );
                }
            }
            "memory" => {}
            other => anyhow::bail!(
                "BINGO_STORE_TYPE '{}' is not supported. Supported types: redis, memory",
                other
            ),
        }

        // Validate log level
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "BINGO_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.bingo_config()
            .validate()
            .context("invalid service configuration")?;

        Ok(())
    }

    /// Core configuration derived from the environment
    fn bingo_config(&self) -> BingoConfig {
        let store = match self.store_type.as_str() {
            "memory" => StoreConfig::Memory,
            _ => StoreConfig::Redis {
                address: self.redis_addr.clone(),
                password: self.redis_password.clone(),
                db: self.redis_db,
            },
        };

        BingoConfig {
            store,
            generator: GeneratorConfig {
                url: self.generator_url.clone(),
            },
            quota: QuotaConfig {
                key_prefix: self.player_key_prefix.clone(),
                strategy: self.quota_strategy,
                ..QuotaConfig::default()
            },
            daily_number: DailyNumberConfig {
                key: self.daily_number_key.clone(),
                expiry: self.daily_number_expiry,
            },
            timeouts: TimeoutConfig {
                store_ms: self.store_timeout_ms,
                generator_ms: self.generator_timeout_ms,
            },
        }
    }

    fn tracing_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return BingoExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return BingoExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.tracing_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return BingoExitCode::ConfigError.into();
    }

    info!("Starting bingod");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return BingoExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let engine = match build_engine(&config).await {
            Ok(engine) => engine,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return BingoExitCode::ConfigError;
            }
        };

        match serve(config.bind_addr, engine).await {
            Ok(()) => BingoExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                BingoExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Connect the store and the generator and assemble the engine
async fn build_engine(config: &Config) -> Result<GuessEngine> {
    let bingo_config = config.bingo_config();

    info!(store = bingo_config.store.type_name(), "connecting store");
    let store = connect_store(&bingo_config.store).await?;
    info!(
        backend = store.backend_name(),
        strategy = ?bingo_config.quota.strategy,
        expiry = ?bingo_config.daily_number.expiry,
        "store ready"
    );

    let generator = HttpNumberGenerator::from_config(
        &bingo_config.generator,
        bingo_config.timeouts.generator(),
    )?;
    info!(url = generator.url(), "generator client ready");
    let generator: Arc<dyn NumberGenerator> = Arc::new(generator);

    Ok(GuessEngine::from_config(store, generator, &bingo_config)?)
}

async fn connect_store(config: &StoreConfig) -> Result<Arc<dyn KvStore>> {
    match config {
        StoreConfig::Memory => {
            warn!("Using the in-memory store: plays and numbers are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "redis")]
        StoreConfig::Redis { password, .. } => {
            if password.is_none() {
                warn!("REDIS_PASSWORD is not set, connecting without AUTH");
            }
            let store = bingo_store_redis::RedisStore::from_config(config).await?;
            info!(address = store.address(), "Redis store ready");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis"))]
        StoreConfig::Redis { .. } => {
            anyhow::bail!("bingod was built without the 'redis' feature")
        }
    }
}

/// Serve HTTP until a shutdown signal, then drain in-flight requests
async fn serve(bind_addr: SocketAddr, engine: GuessEngine) -> Result<()> {
    let state = http::AppState {
        engine: Arc::new(engine),
    };
    let app = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!(%bind_addr, "Start listening");

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            // Server stopped on its own
            result.context("server task panicked")?.context("server error")?;
            return Ok(());
        }
        signal = wait_for_shutdown_signal() => {
            info!("Received shutdown signal: {}", signal?);
        }
    }

    let _ = stop_tx.send(());
    match tokio::time::timeout(SHUTDOWN_DRAIN_TIMEOUT, server).await {
        Ok(result) => {
            result.context("server task panicked")?.context("server error")?;
            info!("Shut down cleanly");
            Ok(())
        }
        Err(_) => Err(anyhow::anyhow!(
            "in-flight requests did not finish within {:?}",
            SHUTDOWN_DRAIN_TIMEOUT
        )),
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
