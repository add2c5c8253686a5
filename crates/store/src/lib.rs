//! Layered key-value store core.
//! - `KeyValueStore<V>`: the contract every layer implements.
//! - `InMemoryStore<V>`: the in-memory (fastest) layer.
//! - `FallbackSlot<V>`: the chain link to an optional downstream layer.
//! - Reads consult the local layer first and warm it from slower layers;
//!   writes propagate through every layer at write time.

pub mod chain;
pub mod error;
pub mod kv;
pub mod memory;

pub use chain::FallbackSlot;
pub use error::StoreError;
pub use kv::KeyValueStore;
pub use memory::InMemoryStore;
