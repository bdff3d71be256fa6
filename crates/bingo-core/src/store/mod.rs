// # Store Implementations
//
// This module provides the in-process implementation of the KvStore trait.
// Networked stores live in their own crates (see `bingo-store-redis`).

pub mod memory;

pub use memory::MemoryStore;
