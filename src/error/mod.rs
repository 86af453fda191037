//! Error handling for the node
//!
//! Consensus rule violations are reported as boolean `false` from the
//! validators, never through this type. `NodeError` covers everything else:
//! I/O, crypto, networking, and the miner's control-flow outcomes.

use std::fmt;

/// Result type alias for node operations
pub type Result<T> = std::result::Result<T, NodeError>;

#[derive(Debug, Clone)]
pub enum NodeError {
    /// Chain store errors
    Store(String),
    /// Cryptographic operation errors
    Crypto(String),
    /// Network communication errors
    Network(String),
    /// Transaction construction or admission errors
    Transaction(String),
    /// Wallet operation errors
    Wallet(String),
    /// Configuration errors
    Config(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// File I/O errors
    Io(String),
    /// Block construction errors
    InvalidBlock(String),
    /// A mined block's template no longer matches the chain tip
    StaleTemplate,
    /// The final append under the chain lock failed
    AppendRejected,
    /// The mining task observed its cancellation token
    Cancelled,
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::Store(msg) => write!(f, "Store error: {msg}"),
            NodeError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            NodeError::Network(msg) => write!(f, "Network error: {msg}"),
            NodeError::Transaction(msg) => write!(f, "Transaction error: {msg}"),
            NodeError::Wallet(msg) => write!(f, "Wallet error: {msg}"),
            NodeError::Config(msg) => write!(f, "Configuration error: {msg}"),
            NodeError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            NodeError::Io(msg) => write!(f, "I/O error: {msg}"),
            NodeError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            NodeError::StaleTemplate => write!(f, "Mining template went stale"),
            NodeError::AppendRejected => write!(f, "Mined block rejected at append"),
            NodeError::Cancelled => write!(f, "Mining cancelled"),
        }
    }
}

impl std::error::Error for NodeError {}

impl From<std::io::Error> for NodeError {
    fn from(err: std::io::Error) -> Self {
        NodeError::Io(err.to_string())
    }
}

impl From<sled::Error> for NodeError {
    fn from(err: sled::Error) -> Self {
        NodeError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for NodeError {
    fn from(err: serde_json::Error) -> Self {
        NodeError::Serialization(err.to_string())
    }
}
