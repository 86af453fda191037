//! Core blockchain functionality
//!
//! This module contains the fundamental components: blocks, transactions,
//! the chain with its consensus rules, merkle roots, and the miner.

pub mod block;
pub mod chain;
pub mod consensus;
pub mod merkle;
pub mod miner;
pub mod transaction;

pub use block::{Block, GENESIS_PREVIOUS_HASH};
pub use chain::Chain;
pub use miner::{CancelToken, Miner, MAX_TEMPLATE_TRANSACTIONS};
pub use transaction::Transaction;
