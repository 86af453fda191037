//! Wallet management and key operations
//!
//! This module holds the key-provider abstraction, the concrete ECDSA P-256
//! wallet, and the file-backed wallet collection.

#[allow(clippy::module_inception)]
pub mod wallet;
pub mod wallets;

pub use wallet::{KeyProvider, Wallet};
pub use wallets::{Wallets, WALLET_FILE};
