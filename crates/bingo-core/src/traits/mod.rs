//! Core traits for the bingo service
//!
//! This module defines the abstract interfaces the coordination logic runs against.
//!
//! - [`KvStore`]: Shared key-value store with per-key expiry
//! - [`NumberGenerator`]: External producer of the number of the day

pub mod generator;
pub mod kv_store;

pub use generator::NumberGenerator;
pub use kv_store::KvStore;
