//! Data storage and persistence
//!
//! This module manages the memory pool of pending transactions and the
//! chain store used to persist the chain across restarts.

pub mod memory_pool;
pub mod store;

pub use memory_pool::MemoryPool;
pub use store::{ChainStore, MemoryStore, SledStore};
