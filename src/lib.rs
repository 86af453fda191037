//! # Quarry Chain - A Proof-of-Work Blockchain Node
//!
//! A peer in a network of equivalent nodes that collectively maintain a
//! replicated, append-only ledger of signed value transfers grouped into
//! proof-of-work blocks. Things to remember when coming back to this code:
//!
//! ## What It Does
//! - **Consensus Core**: fixed-difficulty PoW, halving reward schedule,
//!   account-balance validation replayed over the chain
//! - **Mining**: cancellable template + nonce search loop that re-validates
//!   through the chain before any block lands
//! - **Replication**: gossip over JSON-TCP with longest-chain resolution;
//!   a rejected block triggers a full chain request back to the sender
//! - **Wallets**: ECDSA P-256 keys; the hex SPKI public key is the address
//!
//! ## How The Code Is Organized
//! - `core/`: blocks, transactions, the chain, consensus rules, the miner
//! - `node/`: the coordinator that owns the chain lock and drives everything
//! - `network/`: transport abstraction, TCP gossip, peer registry
//! - `storage/`: memory pool and the persisted chain store
//! - `wallet/`: key provider abstraction and the wallet file
//! - `config/`, `cli/`, `utils/`: the usual supporting cast
//!
//! ## Where To Start Reading
//! 1. `core/consensus.rs` for the rules every node must agree on
//! 2. `node/coordinator.rs` for how mutation, persistence and gossip meet
//! 3. `core/miner.rs` for the mining loop and its cancellation story

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod node;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use crate::cli::{Command, Opt};
pub use crate::config::{Config, GLOBAL_CONFIG};
pub use crate::core::{Block, CancelToken, Chain, Miner, Transaction, MAX_TEMPLATE_TRANSACTIONS};
pub use crate::error::{NodeError, Result};
pub use crate::network::{NoopTransport, Package, Peer, Peers, Server, TcpTransport, Transport};
pub use crate::node::NodeCoordinator;
pub use crate::storage::{ChainStore, MemoryPool, MemoryStore, SledStore};
pub use crate::wallet::{KeyProvider, Wallet, Wallets, WALLET_FILE};
