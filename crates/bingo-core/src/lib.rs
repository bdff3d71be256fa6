// # bingo-core
//
// Core library for the daily "guess the number" service.
//
// ## Architecture Overview
//
// This library owns every decision the service makes:
// - **KvStore**: Trait for the shared TTL key-value store
// - **NumberGenerator**: Trait for the external producer of the day's number
// - **QuotaTracker**: At most one play per user per cycle
// - **DailyNumberResolver**: One shared number per cycle, generated lazily
// - **GuessEngine**: Sequences the two and classifies the guess
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Coordination logic is separate from store and generator implementations
// 2. **Injected Configuration**: Addresses, credentials and deadlines are passed in, never read from the environment
// 3. **Bounded Calls**: Every backend call runs under a deadline
// 4. **Single Writer Per Key**: Writes are `SET NX PX` so concurrent requests converge on one value
// 5. **Library-First**: The daemon is a thin wrapper around this crate

pub mod config;
mod deadline;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod quota;
pub mod resolver;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{
    BingoConfig, DailyNumberConfig, DailyNumberExpiry, GeneratorConfig, QuotaConfig,
    QuotaStrategy, StoreConfig, TimeoutConfig,
};
pub use engine::{Evaluation, GuessEngine};
pub use error::{Error, Result};
pub use outcome::Outcome;
pub use quota::QuotaTracker;
pub use resolver::DailyNumberResolver;
pub use store::MemoryStore;
pub use traits::{KvStore, NumberGenerator};
